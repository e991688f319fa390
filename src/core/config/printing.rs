use crate::core::config::data::Config;

fn show(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("(unset)")
}

impl Config {
    pub fn print_all(&self) {
        println!("Current configuration:");
        println!("  endpoint: {}", show(&self.endpoint));
        println!("  path-info: {}", show(&self.path_info));
        println!("  working-label: {}", show(&self.working_label));
        println!("  transcript-log: {}", show(&self.transcript_log));
        println!("  user-agent: {}", self.user_agent_or_default());
    }
}
