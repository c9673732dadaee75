//! Local name resolution for the lab host names

use std::path::Path;

/// Address the lab ingress is reachable on from the host
pub const LOOPBACK: &str = "127.0.0.1";

/// Default hosts file on Linux and macOS
pub const UNIX_HOSTS_FILE: &str = "/etc/hosts";

/// Host platform, as far as hosts patching cares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    MacOs,
    Windows,
    Other,
}

impl Platform {
    pub fn current() -> Self {
        match std::env::consts::OS {
            "linux" => Platform::Linux,
            "macos" => Platform::MacOs,
            "windows" => Platform::Windows,
            _ => Platform::Other,
        }
    }

    /// Whether the hosts file can be patched with `sudo tee -a`
    pub fn supports_patching(self) -> bool {
        matches!(self, Platform::Linux | Platform::MacOs)
    }
}

/// Host names from `wanted` that no line of `hosts` already maps
pub fn missing_entries(hosts: &str, wanted: &[String]) -> Vec<String> {
    let present: Vec<&str> = hosts
        .lines()
        .map(|line| line.split('#').next().unwrap_or_default())
        .flat_map(|line| line.split_whitespace().skip(1))
        .collect();

    wanted
        .iter()
        .filter(|name| !present.contains(&name.as_str()))
        .cloned()
        .collect()
}

/// Lines to append for the given host names
pub fn render_entries(names: &[String]) -> String {
    names
        .iter()
        .map(|name| format!("{} {}\n", LOOPBACK, name))
        .collect()
}

/// Text to pipe to `tee -a` so `names` land on lines of their own
pub fn append_payload(current: &str, names: &[String]) -> String {
    let entries = render_entries(names);
    if current.is_empty() || current.ends_with('\n') {
        entries
    } else {
        format!("\n{}", entries)
    }
}

/// Instructions for platforms where the file is not patched automatically
pub fn manual_instructions(names: &[String], hosts_file: &Path, platform: Platform) -> String {
    let target = match platform {
        Platform::Windows => "C:\\Windows\\System32\\drivers\\etc\\hosts".to_string(),
        _ => hosts_file.display().to_string(),
    };
    format!(
        "Add the following lines to {} as an administrator:\n{}",
        target,
        render_entries(names)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn existing_mappings_are_skipped() {
        let hosts = "127.0.0.1 localhost\n127.0.0.1 todo.local todo-dev.local\n";
        let missing = missing_entries(hosts, &names(&["todo.local", "todo-dev.local", "argocd.local"]));
        assert_eq!(missing, names(&["argocd.local"]));
    }

    #[test]
    fn comments_do_not_count_as_mappings() {
        let hosts = "# 127.0.0.1 argocd.local\n127.0.0.1 localhost # todo.local\n";
        let missing = missing_entries(hosts, &names(&["todo.local", "argocd.local"]));
        assert_eq!(missing, names(&["todo.local", "argocd.local"]));
    }

    #[test]
    fn address_column_is_not_a_name() {
        let missing = missing_entries("127.0.0.1\n", &names(&["127.0.0.1"]));
        assert_eq!(missing, names(&["127.0.0.1"]));
    }

    #[test]
    fn entries_map_to_loopback() {
        assert_eq!(
            render_entries(&names(&["a.local", "b.local"])),
            "127.0.0.1 a.local\n127.0.0.1 b.local\n"
        );
    }

    #[test]
    fn payload_starts_a_new_line_when_file_lacks_one() {
        let wanted = names(&["todo.local"]);
        assert_eq!(
            append_payload("127.0.0.1 localhost", &wanted),
            "\n127.0.0.1 todo.local\n"
        );
        assert_eq!(
            append_payload("127.0.0.1 localhost\n", &wanted),
            "127.0.0.1 todo.local\n"
        );
        assert_eq!(append_payload("", &wanted), "127.0.0.1 todo.local\n");
    }

    #[test]
    fn instructions_follow_the_given_platform() {
        let wanted = names(&["todo.local"]);
        let unix = Path::new("/etc/hosts");

        let windows = manual_instructions(&wanted, unix, Platform::Windows);
        assert!(windows.contains("C:\\Windows\\System32\\drivers\\etc\\hosts"));
        assert!(!windows.contains("/etc/hosts"));

        let linux = manual_instructions(&wanted, unix, Platform::Linux);
        assert!(linux.contains("/etc/hosts"));
        assert!(linux.ends_with("127.0.0.1 todo.local\n"));
    }

    #[test]
    fn only_unix_platforms_are_patched() {
        assert!(Platform::Linux.supports_patching());
        assert!(Platform::MacOs.supports_patching());
        assert!(!Platform::Windows.supports_patching());
        assert!(!Platform::Other.supports_patching());
    }
}
