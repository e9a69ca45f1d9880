//! Application Configuration

/// Posts application configuration
#[derive(Debug, Clone)]
pub struct PostsConfig {
    /// Subject of the mail sent when a moderator denies a report
    pub rejection_subject: String,
    /// Body of that mail. `{title}` is replaced with the report title.
    pub rejection_body: String,
    /// Longest accepted title, in characters
    pub max_title_length: usize,
    /// Longest accepted description, in characters
    pub max_description_length: usize,
}

impl Default for PostsConfig {
    fn default() -> Self {
        Self {
            rejection_subject: "Your report was not approved".to_string(),
            rejection_body: "Hello,\n\nyour report \"{title}\" was reviewed by a moderator \
                             and was not approved, so it has been removed.\n"
                .to_string(),
            max_title_length: 200,
            max_description_length: 5000,
        }
    }
}

impl PostsConfig {
    /// Create config for development
    pub fn development() -> Self {
        Self::default()
    }

    pub fn with_rejection_notice(
        mut self,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        self.rejection_subject = subject.into();
        self.rejection_body = body.into();
        self
    }

    pub fn rejection_body_for(&self, title: &str) -> String {
        self.rejection_body.replace("{title}", title)
    }
}
