use colored::Colorize;
use portal_client::Navigator;

/// Terminal stand-in for the browser's hard redirect to the login page.
pub struct TerminalNavigator {
    profile: String,
}

impl TerminalNavigator {
    pub fn new(profile: &str) -> Self {
        Self {
            profile: profile.to_string(),
        }
    }
}

impl Navigator for TerminalNavigator {
    fn redirect(&self, route: &str) {
        eprintln!(
            "{} Session expired ({}). Log in again: {}",
            "!".yellow(),
            route.cyan(),
            format!("portal --profile {} login --token <TOKEN>", self.profile).cyan()
        );
    }
}
