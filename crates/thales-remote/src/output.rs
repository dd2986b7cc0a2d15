use std::io::IsTerminal;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use thales_script::Impedance;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct ReplyOutput<'a> {
    command: &'a str,
    reply: &'a str,
    timestamp: String,
}

#[derive(Serialize)]
struct MeasurementOutput {
    potential_v: f64,
    current_a: f64,
    timestamp: String,
}

/// One measured point of an impedance spectrum.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct ImpedancePoint {
    pub frequency_hz: f64,
    pub real_ohm: f64,
    pub imaginary_ohm: f64,
    pub magnitude_ohm: f64,
    pub phase_rad: f64,
}

impl ImpedancePoint {
    pub fn new(frequency: f64, impedance: Impedance) -> Self {
        Self {
            frequency_hz: frequency,
            real_ohm: impedance.real,
            imaginary_ohm: impedance.imaginary,
            magnitude_ohm: impedance.magnitude(),
            phase_rad: impedance.phase(),
        }
    }
}

pub fn print_reply(command: &str, reply: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&ReplyOutput {
            command,
            reply,
            timestamp: now_unix_seconds(),
        }),
        OutputFormat::Table => {
            let mut table = new_table(vec!["COMMAND", "REPLY"]);
            table.add_row(vec![command, reply]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{reply}"),
    }
}

pub fn print_measurement(potential: f64, current: f64, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&MeasurementOutput {
            potential_v: potential,
            current_a: current,
            timestamp: now_unix_seconds(),
        }),
        OutputFormat::Table => {
            let mut table = new_table(vec!["POTENTIAL (V)", "CURRENT (A)"]);
            table.add_row(vec![potential.to_string(), current.to_string()]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("Potential {potential} V");
            println!("Current {current} A");
        }
    }
}

pub fn print_impedance(points: &[ImpedancePoint], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            for point in points {
                print_json(point);
            }
        }
        OutputFormat::Table => {
            let mut table = new_table(vec![
                "FREQUENCY (Hz)",
                "RE (ohm)",
                "IM (ohm)",
                "|Z| (ohm)",
                "PHASE (rad)",
            ]);
            for point in points {
                table.add_row(vec![
                    point.frequency_hz.to_string(),
                    point.real_ohm.to_string(),
                    point.imaginary_ohm.to_string(),
                    point.magnitude_ohm.to_string(),
                    point.phase_rad.to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for point in points {
                println!("frequency {}", point.frequency_hz);
                println!("{}ohm, {}rad", point.magnitude_ohm, point.phase_rad);
            }
        }
    }
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
