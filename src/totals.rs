use anyhow::{Result, anyhow};

use crate::sheet::{Cell, Sheet};

/// Build the Totals rows from the finished network sheet. The WPA/WPA2
/// overlap cannot be expressed as a single-column aggregate, so those three
/// counts are computed here by pairing the two columns row by row; the rest
/// are left as formulas for the spreadsheet to evaluate against the Networks
/// table.
pub fn totals_rows(networks: &Sheet) -> Result<Vec<(String, Cell)>> {
    let wpa = networks
        .column("WPA")
        .ok_or_else(|| anyhow!("network sheet has no WPA column"))?;
    let wpa2 = networks
        .column("WPA2")
        .ok_or_else(|| anyhow!("network sheet has no WPA2 column"))?;

    let mut wpa1_only = 0i64;
    let mut wpa2_only = 0i64;
    let mut wpa_and_wpa2 = 0i64;
    for pair in wpa.iter().zip(wpa2.iter()) {
        match pair {
            (Cell::Int(1), Cell::Int(0)) => wpa1_only += 1,
            (Cell::Int(0), Cell::Int(1)) => wpa2_only += 1,
            (Cell::Int(1), Cell::Int(1)) => wpa_and_wpa2 += 1,
            _ => {}
        }
    }

    let formula = |f: &str| Cell::Formula(f.to_string());
    Ok(vec![
        ("Hidden Networks".to_string(), formula("=SUM(Networks[Hidden])")),
        ("Open Networks".to_string(), formula("=SUM(Networks[Open])")),
        ("WEP Networks".to_string(), formula("=SUM(Networks[WEP])")),
        ("WPAv1 Only".to_string(), Cell::Int(wpa1_only)),
        ("WPAv1 And WPAv2".to_string(), Cell::Int(wpa_and_wpa2)),
        ("WPAv2 Only".to_string(), Cell::Int(wpa2_only)),
        ("Total WPAv1".to_string(), formula("=SUM(Networks[WPA])")),
        ("Total WPAv2".to_string(), formula("=SUM(Networks[WPA2])")),
        ("WPS Enabled".to_string(), formula("=COUNTIF(Networks[WPS], \"Configured\")")),
        ("TKIP Encryption".to_string(), formula("=SUM(Networks[TKIP])")),
        ("AES Encryption".to_string(), formula("=SUM(Networks[AES])")),
        ("Total Networks".to_string(), formula("=COUNTIF(Networks[BSSID], \"*\")")),
    ])
}
