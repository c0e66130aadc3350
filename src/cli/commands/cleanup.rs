use clap::{Arg, Command};

pub fn with_args(command: Command) -> Command {
    let command = with_expired_args(command);
    let command = with_revoked_args(command);
    let command = with_unverified_args(command);
    with_pending_deletion_args(command)
}

fn with_expired_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("cleanup-expired-enabled")
                .long("cleanup-expired-enabled")
                .help("Enable the expired refresh-token purge job")
                .env("ALMANAC_CLEANUP_EXPIRED_ENABLED")
                .default_value("true")
                .value_parser(clap::value_parser!(bool)),
        )
        .arg(
            Arg::new("cleanup-expired-interval-seconds")
                .long("cleanup-expired-interval-seconds")
                .help("Interval between expired refresh-token purges")
                .env("ALMANAC_CLEANUP_EXPIRED_INTERVAL_SECONDS")
                .default_value("3600")
                .value_parser(clap::value_parser!(u64)),
        )
}

fn with_revoked_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("cleanup-revoked-enabled")
                .long("cleanup-revoked-enabled")
                .help("Enable the revoked refresh-token purge job")
                .env("ALMANAC_CLEANUP_REVOKED_ENABLED")
                .default_value("true")
                .value_parser(clap::value_parser!(bool)),
        )
        .arg(
            Arg::new("cleanup-revoked-interval-seconds")
                .long("cleanup-revoked-interval-seconds")
                .help("Interval between revoked refresh-token purges")
                .env("ALMANAC_CLEANUP_REVOKED_INTERVAL_SECONDS")
                .default_value("86400")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("cleanup-revoked-retention-days")
                .long("cleanup-revoked-retention-days")
                .help("Days a revoked refresh token is kept for audit before purge")
                .env("ALMANAC_CLEANUP_REVOKED_RETENTION_DAYS")
                .default_value("30")
                .value_parser(clap::value_parser!(i64)),
        )
}

fn with_unverified_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("cleanup-unverified-enabled")
                .long("cleanup-unverified-enabled")
                .help("Enable the unverified-account purge job")
                .env("ALMANAC_CLEANUP_UNVERIFIED_ENABLED")
                .default_value("true")
                .value_parser(clap::value_parser!(bool)),
        )
        .arg(
            Arg::new("cleanup-unverified-interval-seconds")
                .long("cleanup-unverified-interval-seconds")
                .help("Interval between unverified-account purges")
                .env("ALMANAC_CLEANUP_UNVERIFIED_INTERVAL_SECONDS")
                .default_value("21600")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("cleanup-unverified-max-age-hours")
                .long("cleanup-unverified-max-age-hours")
                .help("Hours an account may stay unverified before purge")
                .env("ALMANAC_CLEANUP_UNVERIFIED_MAX_AGE_HOURS")
                .default_value("24")
                .value_parser(clap::value_parser!(i64)),
        )
}

fn with_pending_deletion_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("cleanup-pending-enabled")
                .long("cleanup-pending-enabled")
                .help("Enable the pending-deletion account purge job")
                .env("ALMANAC_CLEANUP_PENDING_ENABLED")
                .default_value("true")
                .value_parser(clap::value_parser!(bool)),
        )
        .arg(
            Arg::new("cleanup-pending-interval-seconds")
                .long("cleanup-pending-interval-seconds")
                .help("Interval between pending-deletion account purges")
                .env("ALMANAC_CLEANUP_PENDING_INTERVAL_SECONDS")
                .default_value("86400")
                .value_parser(clap::value_parser!(u64)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let command = with_args(Command::new("almanac"));
        let matches = command.get_matches_from(vec!["almanac"]);

        assert_eq!(
            matches.get_one::<bool>("cleanup-unverified-enabled").copied(),
            Some(true)
        );
        assert_eq!(
            matches
                .get_one::<u64>("cleanup-unverified-interval-seconds")
                .copied(),
            Some(21_600)
        );
        assert_eq!(
            matches
                .get_one::<u64>("cleanup-pending-interval-seconds")
                .copied(),
            Some(86_400)
        );
    }

    #[test]
    fn test_disable_job() {
        let command = with_args(Command::new("almanac"));
        let matches = command.get_matches_from(vec![
            "almanac",
            "--cleanup-revoked-enabled",
            "false",
            "--cleanup-revoked-retention-days",
            "7",
        ]);

        assert_eq!(
            matches.get_one::<bool>("cleanup-revoked-enabled").copied(),
            Some(false)
        );
        assert_eq!(
            matches
                .get_one::<i64>("cleanup-revoked-retention-days")
                .copied(),
            Some(7)
        );
    }
}
