//! Per-kind field extraction.
//!
//! Each extractor takes the raw line plus the common date/time/host triple
//! already pulled out by the parser and fills in the kind-specific fields.
//! Fields are extracted independently: an absent optional field is simply
//! `None`, while an absent mandatory field fails the line with
//! `Error::MissingField`.

use regex::Regex;

use crate::error::{Error, Result};
use crate::models::{Event, EventKind};

/// The common triple plus position, shared by every extractor.
#[derive(Debug, Clone)]
pub struct LineMeta {
    pub line_number: u64,
    pub date: String,
    pub time: String,
    pub host: String,
}

/// Compiled field patterns, built once and reused across lines.
pub struct FieldExtractor {
    pid: Regex,
    error_message: Regex,
    auth_message: Regex,
    user_before_from: Regex,
    ipv4: Regex,
    port: Regex,
    session_user: Regex,
    sudo_directory: Regex,
    sudo_user: Regex,
    sudo_command: Regex,
    accepted_message: Regex,
    accepted_user: Regex,
    accepted_ip: Regex,
    fingerprint: Regex,
}

impl FieldExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            pid: Regex::new(r"\[(\d+)\]")?,
            // Text from the `error` keyword up to (not including) `for`.
            error_message: Regex::new(r"(error.*?)for")?,
            auth_message: Regex::new(r"Disconnecting.*?failures")?,
            user_before_from: Regex::new(r"(\w+)\s+from")?,
            ipv4: Regex::new(r"\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}")?,
            port: Regex::new(r"port\s+(\d+)")?,
            session_user: Regex::new(r"user\s(\w+)")?,
            sudo_directory: Regex::new(r"PWD=(.*?)\s+;")?,
            sudo_user: Regex::new(r"USER=(.*?)\s+;")?,
            sudo_command: Regex::new(r"COMMAND=(.*)")?,
            accepted_message: Regex::new(r"Accepted \w+")?,
            accepted_user: Regex::new(r"for\s+(\S+)\s+from")?,
            accepted_ip: Regex::new(r"from\s+(\d{1,3}(?:\.\d{1,3}){3})")?,
            fingerprint: Regex::new(r"SHA256:(\S+)")?,
        })
    }

    /// Extract the kind-specific fields for an already-classified line.
    pub fn extract(&self, kind: EventKind, line: &str, meta: LineMeta) -> Result<Event> {
        match kind {
            EventKind::ErrorFlag => self.error_flag(line, meta),
            EventKind::AuthFailure => self.auth_failure(line, meta),
            EventKind::Disconnect => self.disconnect(line, meta),
            EventKind::SessionOpened => self.session(EventKind::SessionOpened, line, meta),
            EventKind::SessionClosed => self.session(EventKind::SessionClosed, line, meta),
            EventKind::SudoCommand => self.sudo_command(line, meta),
            EventKind::AcceptedPublickey => self.accepted(EventKind::AcceptedPublickey, line, meta),
            EventKind::AcceptedPassword => self.accepted(EventKind::AcceptedPassword, line, meta),
            EventKind::InvalidUser => self.invalid_user(line, meta),
            EventKind::FailedPassword => self.failed_password(line, meta),
        }
    }

    fn error_flag(&self, line: &str, meta: LineMeta) -> Result<Event> {
        let mut event = self.base(EventKind::ErrorFlag, meta);
        event.pid = self.pid(line);
        event.message = self
            .error_message
            .captures(line)
            .map(|c| c[1].trim_end().to_string());
        event.user = required(
            self.user_before_from(line),
            EventKind::ErrorFlag,
            "user",
        )?
        .into();
        event.source_ip = required(self.first_ipv4(line), EventKind::ErrorFlag, "source_ip")?.into();
        event.source_port = self.port(line);
        Ok(event)
    }

    fn auth_failure(&self, line: &str, meta: LineMeta) -> Result<Event> {
        let mut event = self.base(EventKind::AuthFailure, meta);
        event.pid = self.pid(line);
        event.message = self
            .auth_message
            .find(line)
            .map(|m| m.as_str().trim_end().to_string());
        Ok(event)
    }

    fn disconnect(&self, line: &str, meta: LineMeta) -> Result<Event> {
        let mut event = self.base(EventKind::Disconnect, meta);
        event.pid = self.pid(line);
        event.source_ip =
            required(self.first_ipv4(line), EventKind::Disconnect, "source_ip")?.into();
        event.source_port = self.port(line);
        Ok(event)
    }

    fn session(&self, kind: EventKind, line: &str, meta: LineMeta) -> Result<Event> {
        let mut event = self.base(kind, meta);
        event.user = self.session_user.captures(line).map(|c| c[1].to_string());
        Ok(event)
    }

    fn sudo_command(&self, line: &str, meta: LineMeta) -> Result<Event> {
        let mut event = self.base(EventKind::SudoCommand, meta);
        event.directory = required(
            self.sudo_directory.captures(line).map(|c| c[1].to_string()),
            EventKind::SudoCommand,
            "directory",
        )?
        .into();
        event.user = required(
            self.sudo_user.captures(line).map(|c| c[1].to_string()),
            EventKind::SudoCommand,
            "user",
        )?
        .into();
        event.command = required(
            self.sudo_command
                .captures(line)
                .map(|c| c[1].trim_end().to_string()),
            EventKind::SudoCommand,
            "command",
        )?
        .into();
        Ok(event)
    }

    fn accepted(&self, kind: EventKind, line: &str, meta: LineMeta) -> Result<Event> {
        let mut event = self.base(kind, meta);
        event.pid = self.pid(line);
        event.message = self
            .accepted_message
            .find(line)
            .map(|m| m.as_str().to_string());
        event.user = self.accepted_user.captures(line).map(|c| c[1].to_string());
        event.source_ip = self.accepted_ip.captures(line).map(|c| c[1].to_string());
        event.source_port = self.port(line);
        event.key_fingerprint = self.fingerprint.captures(line).map(|c| c[1].to_string());
        Ok(event)
    }

    fn invalid_user(&self, line: &str, meta: LineMeta) -> Result<Event> {
        let mut event = self.base(EventKind::InvalidUser, meta);
        event.pid = self.pid(line);
        event.user = required(
            self.user_before_from(line),
            EventKind::InvalidUser,
            "user",
        )?
        .into();
        event.source_ip =
            required(self.first_ipv4(line), EventKind::InvalidUser, "source_ip")?.into();
        Ok(event)
    }

    fn failed_password(&self, line: &str, meta: LineMeta) -> Result<Event> {
        let mut event = self.base(EventKind::FailedPassword, meta);
        event.pid = self.pid(line);
        event.user = required(
            self.user_before_from(line),
            EventKind::FailedPassword,
            "user",
        )?
        .into();
        event.source_ip =
            required(self.first_ipv4(line), EventKind::FailedPassword, "source_ip")?.into();
        event.source_port = self.port(line);
        Ok(event)
    }

    fn base(&self, kind: EventKind, meta: LineMeta) -> Event {
        Event::new(meta.line_number, kind, meta.date, meta.time, meta.host)
    }

    fn pid(&self, line: &str) -> Option<String> {
        self.pid.captures(line).map(|c| c[1].to_string())
    }

    fn first_ipv4(&self, line: &str) -> Option<String> {
        self.ipv4.find(line).map(|m| m.as_str().to_string())
    }

    fn port(&self, line: &str) -> Option<String> {
        self.port.captures(line).map(|c| c[1].to_string())
    }

    fn user_before_from(&self, line: &str) -> Option<String> {
        self.user_before_from
            .captures(line)
            .map(|c| c[1].to_string())
    }
}

fn required(value: Option<String>, kind: EventKind, field: &'static str) -> Result<String> {
    value.ok_or(Error::MissingField { kind, field })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(line_number: u64, date: &str, time: &str) -> LineMeta {
        LineMeta {
            line_number,
            date: date.to_string(),
            time: time.to_string(),
            host: "ip-10-77-20-248".to_string(),
        }
    }

    fn extractor() -> FieldExtractor {
        FieldExtractor::new().unwrap()
    }

    #[test]
    fn test_extract_error_flag() {
        let line = "Mar 31 10:36:28 ip-10-77-20-248 sshd[19551]: error: maximum authentication attempts exceeded for root from 122.191.89.89 port 37753 ssh2 [preauth]";
        let event = extractor()
            .extract(EventKind::ErrorFlag, line, meta(3903, "2025-03-31", "10:36:28"))
            .unwrap();

        assert_eq!(event.pid.as_deref(), Some("19551"));
        assert_eq!(
            event.message.as_deref(),
            Some("error: maximum authentication attempts exceeded")
        );
        assert_eq!(event.user.as_deref(), Some("root"));
        assert_eq!(event.source_ip.as_deref(), Some("122.191.89.89"));
        assert_eq!(event.source_port.as_deref(), Some("37753"));
        assert_eq!(event.date, "2025-03-31");
        assert_eq!(event.time, "10:36:28");
        assert_eq!(event.host, "ip-10-77-20-248");
        assert_eq!(event.directory, None);
        assert_eq!(event.key_fingerprint, None);
    }

    #[test]
    fn test_extract_auth_failure() {
        let line = "Mar 27 14:01:39 ip-10-77-20-248 sshd[2938]: Disconnecting: Too many authentication failures [preauth]";
        let event = extractor()
            .extract(EventKind::AuthFailure, line, meta(87, "2025-03-27", "14:01:39"))
            .unwrap();

        assert_eq!(event.pid.as_deref(), Some("2938"));
        assert_eq!(
            event.message.as_deref(),
            Some("Disconnecting: Too many authentication failures")
        );
        assert_eq!(event.user, None);
        assert_eq!(event.source_ip, None);
    }

    #[test]
    fn test_extract_disconnect() {
        let line = "Mar 27 14:02:16 ip-10-77-20-248 sshd[2856]: Disconnected from 85.245.107.41 port 54866";
        let event = extractor()
            .extract(EventKind::Disconnect, line, meta(89, "2025-03-27", "14:02:16"))
            .unwrap();

        assert_eq!(event.pid.as_deref(), Some("2856"));
        assert_eq!(event.source_ip.as_deref(), Some("85.245.107.41"));
        assert_eq!(event.source_port.as_deref(), Some("54866"));
        assert_eq!(event.user, None);
    }

    #[test]
    fn test_extract_session_opened_and_closed() {
        let open = "Mar 27 13:09:37 ip-10-77-20-248 sudo: pam_unix(sudo:session): session opened for user root by ubuntu(uid=0)";
        let event = extractor()
            .extract(EventKind::SessionOpened, open, meta(11, "2025-03-27", "13:09:37"))
            .unwrap();
        assert_eq!(event.user.as_deref(), Some("root"));
        assert_eq!(event.pid, None);

        let close = "Mar 27 13:09:38 ip-10-77-20-248 sudo: pam_unix(sudo:session): session closed for user root";
        let event = extractor()
            .extract(EventKind::SessionClosed, close, meta(12, "2025-03-27", "13:09:38"))
            .unwrap();
        assert_eq!(event.user.as_deref(), Some("root"));
    }

    #[test]
    fn test_extract_sudo_command() {
        let line = "Mar 27 13:11:35 ip-10-77-20-248 sudo:   ubuntu : TTY=pts/0 ; PWD=/home/ubuntu ; USER=root ; COMMAND=/usr/bin/apt-get install packetbeat";
        let event = extractor()
            .extract(EventKind::SudoCommand, line, meta(37, "2025-03-27", "13:11:35"))
            .unwrap();

        assert_eq!(event.directory.as_deref(), Some("/home/ubuntu"));
        assert_eq!(event.user.as_deref(), Some("root"));
        assert_eq!(
            event.command.as_deref(),
            Some("/usr/bin/apt-get install packetbeat")
        );
        assert_eq!(event.source_ip, None);
    }

    #[test]
    fn test_extract_accepted_publickey() {
        let line = "Mar 28 14:09:55 ip-10-77-20-248 sshd[29069]: Accepted publickey for ubuntu from 85.245.107.41 port 55779 ssh2: RSA SHA256:Kl8kPGZrTiz7g4FO1hyqHdsSBBb5Fge6NWOobN03XJg";
        let event = extractor()
            .extract(
                EventKind::AcceptedPublickey,
                line,
                meta(841, "2025-03-28", "14:09:55"),
            )
            .unwrap();

        assert_eq!(event.pid.as_deref(), Some("29069"));
        assert_eq!(event.message.as_deref(), Some("Accepted publickey"));
        assert_eq!(event.user.as_deref(), Some("ubuntu"));
        assert_eq!(event.source_ip.as_deref(), Some("85.245.107.41"));
        assert_eq!(event.source_port.as_deref(), Some("55779"));
        assert_eq!(
            event.key_fingerprint.as_deref(),
            Some("Kl8kPGZrTiz7g4FO1hyqHdsSBBb5Fge6NWOobN03XJg")
        );
    }

    #[test]
    fn test_extract_accepted_password_without_fingerprint() {
        let line = "Mar 28 15:32:10 ip-10-77-20-248 sshd[30188]: Accepted password for ubuntu from 85.245.107.41 port 56022 ssh2";
        let event = extractor()
            .extract(
                EventKind::AcceptedPassword,
                line,
                meta(902, "2025-03-28", "15:32:10"),
            )
            .unwrap();

        assert_eq!(event.message.as_deref(), Some("Accepted password"));
        assert_eq!(event.key_fingerprint, None);
        assert_eq!(event.source_port.as_deref(), Some("56022"));
    }

    #[test]
    fn test_extract_invalid_user() {
        let line = "Mar 29 02:14:07 ip-10-77-20-248 sshd[4123]: Invalid user admin from 103.99.0.122";
        let event = extractor()
            .extract(EventKind::InvalidUser, line, meta(120, "2025-03-29", "02:14:07"))
            .unwrap();

        assert_eq!(event.pid.as_deref(), Some("4123"));
        assert_eq!(event.user.as_deref(), Some("admin"));
        assert_eq!(event.source_ip.as_deref(), Some("103.99.0.122"));
        assert_eq!(event.source_port, None);
    }

    #[test]
    fn test_extract_failed_password() {
        let line = "Mar 29 02:14:09 ip-10-77-20-248 sshd[4123]: Failed password for invalid user admin from 103.99.0.122 port 60022 ssh2";
        let event = extractor()
            .extract(
                EventKind::FailedPassword,
                line,
                meta(121, "2025-03-29", "02:14:09"),
            )
            .unwrap();

        assert_eq!(event.user.as_deref(), Some("admin"));
        assert_eq!(event.source_ip.as_deref(), Some("103.99.0.122"));
        assert_eq!(event.source_port.as_deref(), Some("60022"));
    }

    #[test]
    fn test_missing_mandatory_field_fails_the_line() {
        let line = "Mar 29 02:14:09 ip-10-77-20-248 sshd[4123]: Failed password ssh2";
        let err = extractor()
            .extract(
                EventKind::FailedPassword,
                line,
                meta(122, "2025-03-29", "02:14:09"),
            )
            .unwrap_err();

        assert!(matches!(
            err,
            Error::MissingField {
                kind: EventKind::FailedPassword,
                field: "user",
            }
        ));
    }

    #[test]
    fn test_error_flag_without_for_keeps_message_absent() {
        let line = "Mar 30 09:00:00 ip-10-77-20-248 sshd[77]: error: kex protocol mismatch with client 5.6.7.8 from 5.6.7.8 port 11111";
        let event = extractor()
            .extract(EventKind::ErrorFlag, line, meta(7, "2025-03-30", "09:00:00"))
            .unwrap();
        // No `for` token, so the message window never closes.
        assert_eq!(event.message, None);
        assert_eq!(event.source_ip.as_deref(), Some("5.6.7.8"));
    }
}
