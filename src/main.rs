//! Dataview - an SPSS-style data editor with a TUI

mod tui;

use std::env;
use std::path::PathBuf;

use dataview_core::storage::{export_filename, load_path, write_csv};

fn print_usage() {
    eprintln!("Usage: dataview [OPTIONS] [FILE]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  [FILE]                    Dataset to open (.csv or .json)");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -o, --output <FILE>       Export to CSV and exit (non-interactive)");
    eprintln!("  --keymap <name>           Select keybindings (default: default)");
    eprintln!("  --keymap-file <path>      Load keybindings from TOML file");
    eprintln!("  -h, --help                Print help");
}

fn main() {
    let args: Vec<String> = env::args().collect();

    let mut file_path: Option<PathBuf> = None;
    let mut output_file: Option<PathBuf> = None;
    let mut keymap_name: Option<String> = None;
    let mut keymap_file: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_usage();
                return;
            }
            "-o" | "--output" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --output requires a file path");
                    std::process::exit(1);
                }
                output_file = Some(PathBuf::from(&args[i]));
            }
            "--keymap" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --keymap requires a value");
                    std::process::exit(1);
                }
                keymap_name = Some(args[i].to_string());
            }
            "--keymap-file" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --keymap-file requires a file path");
                    std::process::exit(1);
                }
                keymap_file = Some(PathBuf::from(&args[i]));
            }
            arg if arg.starts_with('-') => {
                eprintln!("Error: Unknown option: {}", arg);
                print_usage();
                std::process::exit(1);
            }
            _ => {
                if file_path.is_none() {
                    file_path = Some(PathBuf::from(&args[i]));
                } else {
                    eprintln!("Error: Unexpected argument: {}", args[i]);
                    print_usage();
                    std::process::exit(1);
                }
            }
        }
        i += 1;
    }

    // Non-interactive export does not need a keymap or a terminal.
    if let Some(output_path) = output_file {
        let Some(input) = file_path else {
            eprintln!("Error: --output requires an input file");
            std::process::exit(1);
        };
        let dataset = match load_path(&input) {
            Ok(dataset) => dataset,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        };
        let target = if output_path.as_os_str().is_empty() {
            PathBuf::from(export_filename(dataset.name()))
        } else {
            output_path
        };
        if let Err(e) = write_csv(&target, &dataset) {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
        println!("Exported to {}", target.display());
        return;
    }

    let (keymap, warnings) = tui::load_keymap(keymap_name.as_deref(), keymap_file.as_ref());
    for warning in warnings {
        eprintln!("Warning: {}", warning);
    }

    let mut app = match tui::App::with_file(file_path, keymap) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = tui::run(&mut app) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
