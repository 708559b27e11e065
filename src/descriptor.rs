use crate::error::{Error, Result};
use crate::resources::is_valid_label;

/// the identity of one environment: what it says, and where it lives in the zone.
/// The two are independent, changing the message never moves the endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentDescriptor {
    pub message: String,
    /// relative to the zone, eg: `current` for `current.example.com`
    pub record_name: String,
}

impl EnvironmentDescriptor {
    pub fn new<S: Into<String>>(message: S, record_name: S) -> Result<Self> {
        let record_name = record_name.into().to_ascii_lowercase();
        if let Some(reason) = record_name_error(&record_name) {
            return Err(Error::InvalidRecordName { name: record_name, reason: reason.to_string() });
        }
        Ok(Self { message: message.into(), record_name })
    }

    /// "current" and "pilot", each answering with its own name.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self { message: "current".into(), record_name: "current".into() },
            Self { message: "pilot".into(), record_name: "pilot".into() },
        ]
    }

    /// prefix of every logical id declared for this environment, eg: `Current`
    /// for `current` and `Cloudfrontzdcurrent` for `cloudfront-current`.
    ///
    /// Separators are escaped (`z` as `zz`, `-` as `zd`, `.` as `zp`) so distinct
    /// record names never share a prefix. Only the first character is upper
    /// case, so a prefix can't run into the capitalized suffixes appended to it.
    pub fn logical_prefix(&self) -> String {
        let mut out = String::with_capacity(self.record_name.len() + 2);
        for c in self.record_name.chars() {
            match c {
                'z' => out.push_str("zz"),
                '-' => out.push_str("zd"),
                '.' => out.push_str("zp"),
                c => out.push(c),
            }
        }
        match out.get(..1) {
            Some(first) => first.to_ascii_uppercase() + &out[1..],
            None => out,
        }
    }

    /// physical name of the REST API.
    pub fn api_name(&self) -> String {
        format!("ex{}API", self.record_name)
    }
}

fn record_name_error(record_name: &str) -> Option<&'static str> {
    if record_name.is_empty() {
        return Some("Must not be empty");
    }
    if record_name.contains('*') {
        return Some("Wildcard records are not supported");
    }
    if !record_name.split('.').all(is_valid_label) {
        return Some("Each label must be 1-63 characters of [a-z0-9-] and must not start or end with '-'");
    }
    if !record_name.chars().any(|c| c.is_ascii_alphanumeric()) {
        return Some("Must contain at least one alphanumeric character");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_environments() {
        let envs = EnvironmentDescriptor::defaults();
        let names: Vec<_> = envs.iter().map(|e| e.record_name.as_str()).collect();
        assert_eq!(names, ["current", "pilot"]);
        assert_eq!(envs[0].message, "current");
        assert_eq!(envs[1].api_name(), "expilotAPI");
    }

    #[test]
    fn validates_record_names() {
        assert!(EnvironmentDescriptor::new("x", "cloudfront-current").is_ok());
        assert!(EnvironmentDescriptor::new("x", "v2.api").is_ok());
        assert!(EnvironmentDescriptor::new("x", "").is_err());
        assert!(EnvironmentDescriptor::new("x", "-current").is_err());
        assert!(EnvironmentDescriptor::new("x", "cur rent").is_err());
        assert!(EnvironmentDescriptor::new("x", "*.current").is_err());
        assert!(EnvironmentDescriptor::new("x", "current.").is_err());
    }

    #[test]
    fn record_names_are_lowercased() {
        let env = EnvironmentDescriptor::new("Hello", "Pilot").unwrap();
        assert_eq!(env.record_name, "pilot");
        assert_eq!(env.message, "Hello");
        assert_eq!(env.logical_prefix(), "Pilot");
    }

    #[test]
    fn logical_prefixes_keep_separators_apart() {
        let prefix = |name: &str| EnvironmentDescriptor::new("x", name).unwrap().logical_prefix();
        assert_eq!(prefix("current"), "Current");
        assert_eq!(prefix("blue-green"), "Bluezdgreen");
        assert_eq!(prefix("blue.green"), "Bluezpgreen");
        assert_eq!(prefix("zone"), "Zzone");
        assert_eq!(prefix("1a"), "1a");

        let names = ["blue-green", "blue.green", "bluegreen", "blue--green", "bluezdgreen", "a-1", "a1", "z-d", "zd"];
        let prefixes: Vec<_> = names.iter().map(|n| prefix(n)).collect();
        for (i, a) in prefixes.iter().enumerate() {
            for b in prefixes[i + 1..].iter() {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn logical_prefixes_are_lowercase_after_the_first_char() {
        let prefix = EnvironmentDescriptor::new("x", "cloudfront-current-distribution").unwrap().logical_prefix();
        assert!(prefix[1..].chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }
}
