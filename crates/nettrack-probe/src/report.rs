//! Parser for `nmap -sn` host reports.

const REPORT_PREFIX: &str = "Nmap scan report for ";
const MAC_PREFIX: &str = "MAC Address: ";

/// One live host from a ping scan.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScanHost {
    /// Reverse-DNS / DHCP host name, when nmap resolved one.
    pub name: Option<String>,
    pub address: String,
    pub mac: Option<String>,
    pub vendor: Option<String>,
}

impl ScanHost {
    /// True if `device` identifies this host: a substring of the host name,
    /// the exact IP address, or the MAC address (case-insensitive).
    pub fn matches(&self, device: &str) -> bool {
        let device = device.trim();
        if device.is_empty() {
            return false;
        }
        let lowered = device.to_ascii_lowercase();
        self.name
            .as_deref()
            .is_some_and(|name| name.to_ascii_lowercase().contains(&lowered))
            || self.address == device
            || self
                .mac
                .as_deref()
                .is_some_and(|mac| mac.eq_ignore_ascii_case(device))
    }
}

/// Parse every host report in the scan output. Lines outside a report
/// (banner, summary) are ignored.
pub fn parse_scan_report(output: &str) -> Vec<ScanHost> {
    let mut hosts: Vec<ScanHost> = Vec::new();
    for line in output.lines() {
        let line = line.trim();
        if let Some(target) = line.strip_prefix(REPORT_PREFIX) {
            hosts.push(parse_target(target));
        } else if let Some(rest) = line.strip_prefix(MAC_PREFIX)
            && let Some(host) = hosts.last_mut()
        {
            let (mac, vendor) = split_paren(rest);
            host.mac = Some(mac.to_string());
            host.vendor = vendor.map(str::to_string);
        }
    }
    hosts
}

/// `name (1.2.3.4)` or bare `1.2.3.4`.
fn parse_target(target: &str) -> ScanHost {
    match split_paren(target) {
        (name, Some(address)) => ScanHost {
            name: Some(name.to_string()),
            address: address.to_string(),
            ..ScanHost::default()
        },
        (address, None) => ScanHost {
            address: address.to_string(),
            ..ScanHost::default()
        },
    }
}

/// Split `head (inner)` into `("head", Some("inner"))`.
fn split_paren(s: &str) -> (&str, Option<&str>) {
    match (s.find(" ("), s.strip_suffix(')')) {
        (Some(open), Some(without_close)) => (&s[..open], Some(&without_close[open + 2..])),
        _ => (s.trim(), None),
    }
}
