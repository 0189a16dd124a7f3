use hookfeed_relay::SelfCheckReport;

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const GREEN: &str = "\x1b[32m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Print a human-readable summary of a self-check to stderr.
pub fn print_report(report: &SelfCheckReport) {
    match report {
        SelfCheckReport::Skipped => {
            eprintln!("{YELLOW}warning{RESET}: no team configured, every feed is disabled");
        },
        SelfCheckReport::TeamNotFound {
            team_name,
            available,
        } => {
            eprintln!("{RED}error{RESET}: team {BOLD}{team_name}{RESET} not found");
            if !available.is_empty() {
                eprintln!("  available teams: {}", available.join(", "));
            }
        },
        SelfCheckReport::Incomplete { team_name, reason } => {
            eprintln!(
                "{YELLOW}warning{RESET}: could not list channels of team {BOLD}{team_name}{RESET}: {reason}"
            );
        },
        SelfCheckReport::Completed { team_name, missing } if missing.is_empty() => {
            eprintln!("{GREEN}ok{RESET}: every configured channel exists in team {BOLD}{team_name}{RESET}");
        },
        SelfCheckReport::Completed { team_name, missing } => {
            for channel in missing {
                eprintln!(
                    "{RED}error{RESET}: {} channel {BOLD}{}{RESET} not found in team {team_name}",
                    channel.feed, channel.name
                );
                if !channel.suggestions.is_empty() {
                    eprintln!("  did you mean: {}", channel.suggestions.join(", "));
                }
            }
        },
    }
}
