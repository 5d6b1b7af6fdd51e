use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Result, bail};
use clap::{ArgAction, ColorChoice, CommandFactory, Parser, ValueEnum};
use clap_complete::Shell;
use comfy_table::{ContentArrangement, Table};
use is_terminal::IsTerminal;

mod aggregate;
mod coords;
mod extract;
mod file_scan;
mod netxml;
mod sheet;
mod totals;
mod xlsx;

use aggregate::Aggregator;
use extract::{CLIENT_HEADERS, ClientRow, NETWORK_HEADERS, NetworkRow};
use sheet::{Cell, Sheet};

static ENABLE_COLOR: OnceLock<bool> = OnceLock::new();

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel { Error, Warn, Info, Debug, Trace }

#[derive(Parser, Debug)]
#[command(
    name = "netxml2xlsx",
    about = "Convert Kismet netxml survey captures to an XLSX report",
    long_about = "Converts one or more Kismet netxml wireless-survey captures into a deduplicated XLSX workbook with Wireless Networks, Clients, and Totals sheets, plus optional JSON/CSV exports.",
    after_long_help = "Examples:\n  netxml2xlsx site1.netxml site2.netxml -o survey.xlsx\n  netxml2xlsx --dir ./captures -o survey.xlsx\n  netxml2xlsx site.netxml --json-path survey.json --csv-dir ./exports",
    color = ColorChoice::Auto
)]
struct Args {
    /// One or more netxml files, space separated (directories with --dir)
    #[arg(required_unless_present = "completions")]
    input: Vec<PathBuf>,
    /// Output workbook path
    #[arg(long, short = 'o', default_value = "netxml.xlsx")]
    output: PathBuf,
    /// Treat the inputs as directories of netxml files
    #[arg(long, short = 'd', default_value_t = false)]
    dir: bool,
    /// Also write the deduplicated tables to this JSON path
    #[arg(long, short = 'j')]
    json_path: Option<PathBuf>,
    /// Also write networks.csv and clients.csv into this directory
    #[arg(long)]
    csv_dir: Option<PathBuf>,
    #[arg(short = 'v', long, action = ArgAction::Count)]
    verbose: u8,
    #[arg(short = 'q', long, default_value_t = false)]
    quiet: bool,
    #[arg(long)]
    log_level: Option<LogLevel>,
    #[arg(long, short = 'C', default_value_t = false)]
    no_color: bool,
    #[arg(long, default_value_t = false)]
    force_color: bool,
    #[arg(long, value_enum)]
    completions: Option<Shell>,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            input: vec![],
            output: PathBuf::from("netxml.xlsx"),
            dir: false,
            json_path: None,
            csv_dir: None,
            verbose: 0,
            quiet: false,
            log_level: None,
            no_color: false,
            force_color: false,
            completions: None,
        }
    }
}

fn main() {
    let args = Args::parse();
    if let Some(sh) = args.completions {
        let mut cmd = Args::command();
        clap_complete::generate(sh, &mut cmd, "netxml2xlsx", &mut std::io::stdout());
        return;
    }
    {
        let mut builder =
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
        if args.quiet {
            builder.filter_level(log::LevelFilter::Error);
        } else if let Some(lvl) = args.log_level {
            let f = match lvl { LogLevel::Error => log::LevelFilter::Error, LogLevel::Warn => log::LevelFilter::Warn, LogLevel::Info => log::LevelFilter::Info, LogLevel::Debug => log::LevelFilter::Debug, LogLevel::Trace => log::LevelFilter::Trace };
            builder.filter_level(f);
        } else if args.verbose > 0 {
            let f = if args.verbose >= 3 { log::LevelFilter::Trace } else if args.verbose == 2 { log::LevelFilter::Debug } else { log::LevelFilter::Info };
            builder.filter_level(f);
        }
        builder.init();
    }
    let term = std::env::var("TERM").unwrap_or_default();
    let no_color_env = std::env::var_os("NO_COLOR").is_some();
    let color_default = std::io::stdout().is_terminal() && !no_color_env && term != "dumb";
    let enable_color = if args.force_color { true } else { color_default && !args.no_color };
    let _ = ENABLE_COLOR.set(enable_color);

    let inputs = file_scan::resolve_inputs(&args.input, args.dir);
    if inputs.is_empty() {
        log::error!("No readable input files remain. Quitting...");
        std::process::exit(2);
    }
    if let Err(e) = run(&args, &inputs) {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args, inputs: &[PathBuf]) -> Result<()> {
    if args.output.exists() {
        bail!("{} already exists. Refusing to overwrite.", args.output.display());
    }
    let mut agg = Aggregator::new();
    for path in inputs {
        let root = netxml::parse_file(path)?;
        let ex = extract::extract_document(&root);
        log::info!(
            "{}: {} network rows, {} client rows",
            path.display(),
            ex.networks.len(),
            ex.clients.len()
        );
        agg.absorb(ex);
    }
    log::info!("{} unique networks, {} unique clients", agg.network_count(), agg.client_count());
    let (networks, clients) = agg.into_rows();

    let mut networks_sheet = Sheet::new("Wireless Networks", &NETWORK_HEADERS);
    for n in &networks {
        networks_sheet.append(n.to_row());
    }
    let mut clients_sheet = Sheet::new("Clients", &CLIENT_HEADERS);
    for c in &clients {
        clients_sheet.append(c.to_row());
    }
    let totals = totals::totals_rows(&networks_sheet)?;
    let mut totals_sheet = Sheet::new("Totals", &["Data Set", "Totals"]);
    for (label, value) in &totals {
        totals_sheet.append(vec![Cell::text(label.clone()), value.clone()]);
    }

    xlsx::write_workbook(
        &args.output,
        &[
            (&networks_sheet, "Networks"),
            (&clients_sheet, "Clients"),
            (&totals_sheet, "Totals"),
        ],
    )?;
    if !args.quiet {
        println!("{}", paint(&format!("XLSX written: {}", args.output.display()), "1;36"));
    }

    if let Some(p) = args.json_path.as_ref() {
        match write_json(p, &networks, &clients) {
            Ok(()) => { if !args.quiet { println!("{}", paint(&format!("JSON written: {}", p.display()), "1;36")); } }
            Err(e) => log::error!("JSON write failed for {}: {}", p.display(), e),
        }
    }
    if let Some(dir) = args.csv_dir.as_ref() {
        match write_csv(dir, &networks, &clients) {
            Ok(()) => { if !args.quiet { println!("{}", paint(&format!("CSV written: {}", dir.display()), "1;36")); } }
            Err(e) => log::error!("CSV write failed for {}: {}", dir.display(), e),
        }
    }
    if !args.quiet {
        print_summary(&totals, networks.len(), clients.len());
    }
    Ok(())
}

fn write_json(path: &Path, networks: &[NetworkRow], clients: &[ClientRow]) -> std::io::Result<()> {
    let obj = serde_json::json!({ "networks": networks, "clients": clients });
    std::fs::write(path, serde_json::to_vec_pretty(&obj).unwrap())
}

fn write_csv(dir: &Path, networks: &[NetworkRow], clients: &[ClientRow]) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    let mut wtr = csv::Writer::from_path(dir.join("networks.csv"))?;
    wtr.write_record(NETWORK_HEADERS)?;
    for n in networks {
        wtr.write_record([
            n.bssid.clone(),
            n.essid.clone(),
            n.hidden.to_string(),
            n.channel.clone(),
            n.signal.clone(),
            n.open.to_string(),
            n.wep.to_string(),
            n.wpa.to_string(),
            n.wpa2.to_string(),
            n.wps.clone(),
            n.auth.clone(),
            n.tkip.to_string(),
            n.aes.to_string(),
            n.manufacturer.clone(),
            n.clients.to_string(),
            n.latitude.clone(),
            n.longitude.clone(),
        ])?;
    }
    wtr.flush()?;
    let mut wtr = csv::Writer::from_path(dir.join("clients.csv"))?;
    wtr.write_record(CLIENT_HEADERS)?;
    for c in clients {
        wtr.write_record([
            c.mac.clone(),
            c.manufacturer.clone(),
            c.signal.clone(),
            c.bssid.clone(),
            c.essid.clone(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Console recap of the locally computed counts; the formula-backed totals
/// live in the workbook where the spreadsheet evaluates them.
fn print_summary(totals: &[(String, Cell)], networks: usize, clients: usize) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![paint("Data Set", "1"), paint("Totals", "1")]);
    table.add_row(vec!["Unique Networks".to_string(), networks.to_string()]);
    table.add_row(vec!["Unique Clients".to_string(), clients.to_string()]);
    for (label, value) in totals {
        if let Cell::Int(v) = value {
            table.add_row(vec![label.clone(), v.to_string()]);
        }
    }
    println!("{}", table);
}

fn paint(s: &str, code: &str) -> String {
    if *ENABLE_COLOR.get().unwrap_or(&false) {
        format!("\x1b[{}m{}\x1b[0m", code, s)
    } else {
        s.to_string()
    }
}
