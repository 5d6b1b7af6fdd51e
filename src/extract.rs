use serde::Serialize;

use crate::netxml::Element;
use crate::sheet::Cell;

pub const NETWORK_HEADERS: [&str; 17] = [
    "BSSID", "ESSID", "Hidden", "Channel", "Signal Strength", "Open", "WEP", "WPA", "WPA2",
    "WPS", "Auth", "TKIP", "AES", "Manufacturer", "No. Clients", "Latitude", "Longitude",
];

pub const CLIENT_HEADERS: [&str; 5] = ["MAC", "Manufacturer", "Signal Strength", "BSSID", "ESSID"];

/// One discovered access point. Two scans of the same BSSID that differ in any
/// field (a new signal reading, say) are distinct rows, so equality and
/// ordering cover the whole tuple.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NetworkRow {
    pub bssid: String,
    pub essid: String,
    pub hidden: u8,
    pub channel: String,
    pub signal: String,
    pub open: u8,
    pub wep: u8,
    pub wpa: u8,
    pub wpa2: u8,
    pub wps: String,
    pub auth: String,
    pub tkip: u8,
    pub aes: u8,
    pub manufacturer: String,
    pub clients: u32,
    pub latitude: String,
    pub longitude: String,
}

impl NetworkRow {
    pub fn to_row(&self) -> Vec<Cell> {
        vec![
            Cell::text(&self.bssid),
            Cell::text(&self.essid),
            Cell::Int(self.hidden as i64),
            Cell::text(&self.channel),
            Cell::text(&self.signal),
            Cell::Int(self.open as i64),
            Cell::Int(self.wep as i64),
            Cell::Int(self.wpa as i64),
            Cell::Int(self.wpa2 as i64),
            Cell::text(&self.wps),
            Cell::text(&self.auth),
            Cell::Int(self.tkip as i64),
            Cell::Int(self.aes as i64),
            Cell::text(&self.manufacturer),
            Cell::Int(self.clients as i64),
            Cell::text(&self.latitude),
            Cell::text(&self.longitude),
        ]
    }
}

/// One client-to-network association. The owning network's name is carried
/// denormalized so the client table reads on its own.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ClientRow {
    pub mac: String,
    pub manufacturer: String,
    pub signal: String,
    pub bssid: String,
    pub essid: String,
}

impl ClientRow {
    pub fn to_row(&self) -> Vec<Cell> {
        vec![
            Cell::text(&self.mac),
            Cell::text(&self.manufacturer),
            Cell::text(&self.signal),
            Cell::text(&self.bssid),
            Cell::text(&self.essid),
        ]
    }
}

/// Rows pulled out of a single parsed capture file.
#[derive(Clone, Debug, Default)]
pub struct Extraction {
    pub networks: Vec<NetworkRow>,
    pub clients: Vec<ClientRow>,
}

enum Encryption {
    Wep,
    Wpa(Option<WpaMode>),
    Open,
}

enum WpaMode {
    Psk,
    AesCcm,
    Tkip,
}

fn classify_encryption(text: &str) -> Option<Encryption> {
    if text.starts_with("WEP") {
        return Some(Encryption::Wep);
    }
    if text.starts_with("WPA") {
        let mode = if text.ends_with("PSK") {
            Some(WpaMode::Psk)
        } else if text.ends_with("AES-CCM") {
            Some(WpaMode::AesCcm)
        } else if text.ends_with("TKIP") {
            Some(WpaMode::Tkip)
        } else {
            None
        };
        return Some(Encryption::Wpa(mode));
    }
    if text == "None" {
        return Some(Encryption::Open);
    }
    None
}

// Readings are dBm and negative in practice; a value above 1 is a sensor
// glitch, so the chain falls through to the next reading.
fn above_one(s: &str) -> bool {
    s.trim().parse::<i64>().map(|v| v > 1).unwrap_or(false)
}

fn child_text(node: &Element, name: &str) -> String {
    node.child(name).map(|e| e.text().to_string()).unwrap_or_default()
}

/// Walk every wireless-network record in the document and collect network and
/// client rows.
pub fn extract_document(root: &Element) -> Extraction {
    let mut out = Extraction::default();
    for network in root.descendants_named("wireless-network") {
        if let Some(row) = extract_network(network, &mut out.clients) {
            out.networks.push(row);
        }
    }
    out
}

fn extract_network(network: &Element, clients: &mut Vec<ClientRow>) -> Option<NetworkRow> {
    let net_type = network.attr("type").unwrap_or("");
    let channel = child_text(network, "channel");
    // Probe requests and channel-0 entries are not real access points.
    if net_type == "probe" || channel == "0" {
        return None;
    }
    let bssid = child_text(network, "BSSID");
    let manufacturer = child_text(network, "manuf");

    let mut open = 0u8;
    let mut wep = 0u8;
    let mut wpa = 0u8;
    let mut wpa2 = 0u8;
    let mut tkip = 0u8;
    let mut aes = 0u8;
    let mut hidden = 0u8;
    let mut auth = "N/A".to_string();
    let mut essid = String::new();
    let mut wps = String::new();

    if let Some(ssid) = network.child("SSID") {
        for enc in ssid.children_named("encryption") {
            match classify_encryption(enc.text()) {
                Some(Encryption::Wep) => {
                    // WEP trumps whatever else the record claims.
                    wep = 1;
                    break;
                }
                Some(Encryption::Wpa(mode)) => match mode {
                    Some(WpaMode::Psk) => auth = "PSK".to_string(),
                    Some(WpaMode::AesCcm) => aes = 1,
                    Some(WpaMode::Tkip) => tkip = 1,
                    None => {}
                },
                Some(Encryption::Open) => open = 1,
                None => {}
            }
        }
        let version = child_text(ssid, "wpa-version");
        let versions: Vec<&str> = version.split('+').collect();
        wpa = versions.iter().any(|v| *v == "WPA") as u8;
        wpa2 = versions.iter().any(|v| *v == "WPA2") as u8;
        if let Some(e) = ssid.child("essid") {
            essid = e.text().to_string();
            hidden = (e.attr("cloaked") == Some("true")) as u8;
        }
        wps = child_text(ssid, "wps");
    }

    let mut signal = String::new();
    if let Some(snr) = network.child("snr-info") {
        signal = child_text(snr, "max_signal_dbm");
        if above_one(&signal) {
            signal = child_text(snr, "last_signal_dbm");
        }
        if above_one(&signal) {
            signal = child_text(snr, "min_signal_dbm");
        }
    }

    let (mut latitude, mut longitude) = (String::new(), String::new());
    if let Some(gps) = network.child("gps-info") {
        latitude = child_text(gps, "avg-lat");
        longitude = child_text(gps, "avg-lon");
    }

    let client_count = summarize_clients(network, &bssid, &essid, clients);

    Some(NetworkRow {
        bssid,
        essid,
        hidden,
        channel,
        signal,
        open,
        wep,
        wpa,
        wpa2,
        wps,
        auth,
        tkip,
        aes,
        manufacturer,
        clients: client_count,
        latitude,
        longitude,
    })
}

/// Append a row per well-formed associated client and return how many were
/// appended. Clients missing their MAC or signal readings are dropped and do
/// not count toward the owning network.
fn summarize_clients(
    network: &Element,
    bssid: &str,
    essid: &str,
    out: &mut Vec<ClientRow>,
) -> u32 {
    let mut count = 0u32;
    for client in network.descendants_named("wireless-client") {
        let mac = match client.child("client-mac") {
            Some(m) => m,
            None => continue,
        };
        let snr = match client.child("snr-info") {
            Some(s) => s,
            None => continue,
        };
        let power = match snr.child("max_signal_dbm") {
            Some(p) => p,
            None => continue,
        };
        let manufacturer = child_text(client, "client-manuf");
        out.push(ClientRow {
            mac: mac.text().to_string(),
            manufacturer,
            signal: power.text().to_string(),
            bssid: bssid.to_string(),
            essid: essid.to_string(),
        });
        count += 1;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netxml::parse_str;

    fn network_doc(body: &str) -> Extraction {
        let xml = format!("<detection-run>{}</detection-run>", body);
        extract_document(&parse_str(&xml).unwrap())
    }

    fn basic_network(ssid_body: &str, extra: &str) -> String {
        format!(
            "<wireless-network type=\"infrastructure\">\
             <SSID>{}</SSID>\
             <BSSID>AA:BB:CC:DD:EE:FF</BSSID>\
             <manuf>AcmeCorp</manuf>\
             <channel>6</channel>{}\
             </wireless-network>",
            ssid_body, extra
        )
    }

    #[test]
    fn wep_short_circuits_descriptor_scan() {
        let ex = network_doc(&basic_network(
            "<essid cloaked=\"false\">Shop</essid>\
             <encryption>WEP40</encryption><encryption>WPA+PSK</encryption>",
            "",
        ));
        let n = &ex.networks[0];
        assert_eq!((n.wep, n.open, n.wpa, n.wpa2), (1, 0, 0, 0));
        // The scan stopped at WEP, so the later PSK descriptor changed nothing.
        assert_eq!(n.auth, "N/A");
    }

    #[test]
    fn wpa_suffixes_set_independent_flags() {
        let ex = network_doc(&basic_network(
            "<essid cloaked=\"false\">Shop</essid>\
             <wpa-version>WPA</wpa-version>\
             <encryption>WPA+PSK</encryption><encryption>WPA+TKIP</encryption>",
            "",
        ));
        let n = &ex.networks[0];
        assert_eq!((n.wpa, n.wpa2), (1, 0));
        assert_eq!(n.auth, "PSK");
        assert_eq!((n.tkip, n.aes), (1, 0));
    }

    #[test]
    fn none_descriptor_marks_network_open() {
        let ex = network_doc(&basic_network(
            "<essid cloaked=\"false\">Shop</essid><encryption>None</encryption>",
            "",
        ));
        let n = &ex.networks[0];
        assert_eq!((n.open, n.wep, n.wpa, n.wpa2, n.tkip, n.aes), (1, 0, 0, 0, 0, 0));
    }

    #[test]
    fn wpa_version_tokens_drive_both_flags() {
        let ex = network_doc(&basic_network(
            "<essid cloaked=\"false\">Shop</essid>\
             <wpa-version>WPA+WPA2</wpa-version>\
             <encryption>WPA+AES-CCM</encryption>",
            "",
        ));
        let n = &ex.networks[0];
        assert_eq!((n.wpa, n.wpa2), (1, 1));
        assert_eq!(n.aes, 1);
    }

    #[test]
    fn cloaked_essid_sets_hidden() {
        let ex = network_doc(&basic_network("<essid cloaked=\"true\"></essid>", ""));
        let n = &ex.networks[0];
        assert_eq!(n.hidden, 1);
        assert_eq!(n.essid, "");
    }

    #[test]
    fn wps_status_is_copied_verbatim() {
        let ex = network_doc(&basic_network(
            "<essid cloaked=\"false\">Shop</essid><wps>Configured</wps>",
            "",
        ));
        assert_eq!(ex.networks[0].wps, "Configured");
    }

    #[test]
    fn missing_ssid_block_leaves_defaults() {
        let ex = network_doc(
            "<wireless-network type=\"infrastructure\">\
             <BSSID>AA:BB:CC:DD:EE:FF</BSSID><manuf>AcmeCorp</manuf><channel>6</channel>\
             </wireless-network>",
        );
        let n = &ex.networks[0];
        assert_eq!(n.essid, "");
        assert_eq!(n.hidden, 0);
        assert_eq!(n.wps, "");
        assert_eq!((n.open, n.wep, n.wpa, n.wpa2), (0, 0, 0, 0));
        assert_eq!(n.auth, "N/A");
    }

    #[test]
    fn probe_records_are_skipped_entirely() {
        let ex = network_doc(
            "<wireless-network type=\"probe\">\
             <SSID><essid cloaked=\"false\">Probe</essid></SSID>\
             <BSSID>AA:BB:CC:DD:EE:FF</BSSID><channel>6</channel>\
             <wireless-client><client-mac>11:22:33:44:55:66</client-mac>\
             <snr-info><max_signal_dbm>-40</max_signal_dbm></snr-info></wireless-client>\
             </wireless-network>",
        );
        assert!(ex.networks.is_empty());
        assert!(ex.clients.is_empty());
    }

    #[test]
    fn channel_zero_records_are_skipped_with_their_clients() {
        let ex = network_doc(&format!(
            "<wireless-network type=\"infrastructure\">\
             <SSID><essid cloaked=\"false\">Shop</essid></SSID>\
             <BSSID>AA:BB:CC:DD:EE:FF</BSSID><channel>0</channel>{}\
             </wireless-network>",
            "<wireless-client><client-mac>11:22:33:44:55:66</client-mac>\
             <snr-info><max_signal_dbm>-40</max_signal_dbm></snr-info></wireless-client>"
        ));
        assert!(ex.networks.is_empty());
        assert!(ex.clients.is_empty());
    }

    #[test]
    fn ordinary_negative_reading_is_kept() {
        let ex = network_doc(&basic_network(
            "<essid cloaked=\"false\">Shop</essid>",
            "<snr-info><max_signal_dbm>-40</max_signal_dbm>\
             <last_signal_dbm>-55</last_signal_dbm>\
             <min_signal_dbm>-80</min_signal_dbm></snr-info>",
        ));
        assert_eq!(ex.networks[0].signal, "-40");
    }

    #[test]
    fn signal_fallback_distrusts_positive_readings() {
        let ex = network_doc(&basic_network(
            "<essid cloaked=\"false\">Shop</essid>",
            "<snr-info><max_signal_dbm>7</max_signal_dbm>\
             <last_signal_dbm>-55</last_signal_dbm>\
             <min_signal_dbm>-80</min_signal_dbm></snr-info>",
        ));
        assert_eq!(ex.networks[0].signal, "-55");
    }

    #[test]
    fn signal_fallback_can_reach_the_minimum_reading() {
        let ex = network_doc(&basic_network(
            "<essid cloaked=\"false\">Shop</essid>",
            "<snr-info><max_signal_dbm>7</max_signal_dbm>\
             <last_signal_dbm>3</last_signal_dbm>\
             <min_signal_dbm>-80</min_signal_dbm></snr-info>",
        ));
        assert_eq!(ex.networks[0].signal, "-80");
    }

    #[test]
    fn missing_snr_info_leaves_signal_empty() {
        let ex = network_doc(&basic_network("<essid cloaked=\"false\">Shop</essid>", ""));
        assert_eq!(ex.networks[0].signal, "");
    }

    #[test]
    fn gps_coordinates_are_copied_verbatim() {
        let ex = network_doc(&basic_network(
            "<essid cloaked=\"false\">Shop</essid>",
            "<gps-info><avg-lat>51.507222</avg-lat><avg-lon>-0.127500</avg-lon></gps-info>",
        ));
        let n = &ex.networks[0];
        assert_eq!(n.latitude, "51.507222");
        assert_eq!(n.longitude, "-0.127500");
    }

    #[test]
    fn clients_inherit_owner_identity_and_are_counted() {
        let ex = network_doc(&basic_network(
            "<essid cloaked=\"false\">Shop</essid>",
            "<wireless-client><client-mac>11:22:33:44:55:66</client-mac>\
             <client-manuf>Phoneco</client-manuf>\
             <snr-info><max_signal_dbm>-48</max_signal_dbm></snr-info></wireless-client>",
        ));
        assert_eq!(ex.networks[0].clients, 1);
        let c = &ex.clients[0];
        assert_eq!(c.mac, "11:22:33:44:55:66");
        assert_eq!(c.manufacturer, "Phoneco");
        assert_eq!(c.signal, "-48");
        assert_eq!(c.bssid, "AA:BB:CC:DD:EE:FF");
        assert_eq!(c.essid, "Shop");
    }

    #[test]
    fn malformed_clients_are_dropped_from_rows_and_count() {
        let ex = network_doc(&basic_network(
            "<essid cloaked=\"false\">Shop</essid>",
            // No MAC.
            "<wireless-client><snr-info><max_signal_dbm>-48</max_signal_dbm></snr-info>\
             </wireless-client>\
             <wireless-client><client-mac>22:22:22:22:22:22</client-mac></wireless-client>\
             <wireless-client><client-mac>33:33:33:33:33:33</client-mac>\
             <snr-info></snr-info></wireless-client>\
             <wireless-client><client-mac>44:44:44:44:44:44</client-mac>\
             <snr-info><max_signal_dbm>-60</max_signal_dbm></snr-info></wireless-client>",
        ));
        assert_eq!(ex.networks[0].clients, 1);
        assert_eq!(ex.clients.len(), 1);
        assert_eq!(ex.clients[0].mac, "44:44:44:44:44:44");
    }

    #[test]
    fn missing_client_manufacturer_defaults_to_empty() {
        let ex = network_doc(&basic_network(
            "<essid cloaked=\"false\">Shop</essid>",
            "<wireless-client><client-mac>11:22:33:44:55:66</client-mac>\
             <snr-info><max_signal_dbm>-48</max_signal_dbm></snr-info></wireless-client>",
        ));
        assert_eq!(ex.clients[0].manufacturer, "");
    }
}
