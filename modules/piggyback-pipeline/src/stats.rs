/// Counters from one collection run.
#[derive(Debug, Default)]
pub struct RunStats {
    pub profiles_total: u32,
    pub profiles_processed: u32,
    pub profiles_failed: u32,
    pub profiles_rejected: u32,
    pub posts_fetched: u32,
    pub posts_recent: u32,
    pub posts_replies: u32,
    pub posts_merged: u32,
    pub posts_new: u32,
    pub posts_classified: u32,
    pub posts_matched: u32,
    pub audit_rows_written: u32,
    pub output_rows_written: u32,
}

impl std::fmt::Display for RunStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Collection Run Complete ===")?;
        writeln!(f, "Profiles total:     {}", self.profiles_total)?;
        writeln!(f, "Profiles processed: {}", self.profiles_processed)?;
        writeln!(f, "Profiles failed:    {}", self.profiles_failed)?;
        writeln!(f, "Profiles rejected:  {}", self.profiles_rejected)?;
        writeln!(f, "Posts fetched:      {}", self.posts_fetched)?;
        writeln!(f, "Posts recent:       {}", self.posts_recent)?;
        writeln!(f, "Reply posts:        {}", self.posts_replies)?;
        writeln!(f, "After merging:      {}", self.posts_merged)?;
        writeln!(f, "New this run:       {}", self.posts_new)?;
        writeln!(f, "Classified:         {}", self.posts_classified)?;
        let classified = self.posts_classified.max(1);
        writeln!(
            f,
            "Matched:            {} ({:.0}%)",
            self.posts_matched,
            self.posts_matched as f64 / classified as f64 * 100.0
        )?;
        writeln!(f, "Audit rows:         {}", self.audit_rows_written)?;
        writeln!(f, "Output rows:        {}", self.output_rows_written)?;
        Ok(())
    }
}
