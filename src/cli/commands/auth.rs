use clap::{Arg, Command};

pub fn with_args(command: Command) -> Command {
    let command = with_token_args(command);
    let command = with_verification_args(command);
    with_account_args(command)
}

fn with_token_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("access-token-ttl-ms")
                .long("access-token-ttl-ms")
                .help("Access token TTL in milliseconds")
                .env("ALMANAC_ACCESS_TOKEN_TTL_MS")
                .default_value("900000")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("refresh-token-ttl-ms")
                .long("refresh-token-ttl-ms")
                .help("Refresh token TTL in milliseconds")
                .env("ALMANAC_REFRESH_TOKEN_TTL_MS")
                .default_value("2592000000")
                .value_parser(clap::value_parser!(i64)),
        )
}

fn with_verification_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("frontend-base-url")
                .long("frontend-base-url")
                .help("Frontend base URL used for verification links")
                .env("ALMANAC_FRONTEND_BASE_URL")
                .default_value("https://almanac.dev"),
        )
        .arg(
            Arg::new("verification-token-ttl-seconds")
                .long("verification-token-ttl-seconds")
                .help("Email verification token TTL in seconds")
                .env("ALMANAC_VERIFICATION_TOKEN_TTL_SECONDS")
                .default_value("1800")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("verification-resend-cooldown-seconds")
                .long("verification-resend-cooldown-seconds")
                .help("Cooldown before resending verification emails")
                .env("ALMANAC_VERIFICATION_RESEND_COOLDOWN_SECONDS")
                .default_value("60")
                .value_parser(clap::value_parser!(i64)),
        )
}

fn with_account_args(command: Command) -> Command {
    command.arg(
        Arg::new("deletion-grace-days")
            .long("deletion-grace-days")
            .help("Days an account stays recoverable after a deletion request")
            .env("ALMANAC_DELETION_GRACE_DAYS")
            .default_value("30")
            .value_parser(clap::value_parser!(i64)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_command() -> Command {
        with_args(Command::new("almanac"))
    }

    #[test]
    fn test_token_defaults() {
        let matches = base_command().get_matches_from(vec!["almanac"]);

        assert_eq!(
            matches.get_one::<i64>("access-token-ttl-ms").copied(),
            Some(900_000)
        );
        assert_eq!(
            matches.get_one::<i64>("refresh-token-ttl-ms").copied(),
            Some(2_592_000_000)
        );
        assert_eq!(
            matches.get_one::<i64>("deletion-grace-days").copied(),
            Some(30)
        );
    }

    #[test]
    fn test_env_overrides() {
        temp_env::with_vars(
            [
                ("ALMANAC_ACCESS_TOKEN_TTL_MS", Some("60000")),
                ("ALMANAC_FRONTEND_BASE_URL", Some("https://cal.example.com")),
            ],
            || {
                let matches = base_command().get_matches_from(vec!["almanac"]);
                assert_eq!(
                    matches.get_one::<i64>("access-token-ttl-ms").copied(),
                    Some(60_000)
                );
                assert_eq!(
                    matches
                        .get_one::<String>("frontend-base-url")
                        .map(|s| s.to_string()),
                    Some("https://cal.example.com".to_string())
                );
            },
        );
    }
}
