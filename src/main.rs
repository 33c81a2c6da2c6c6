use std::env;
use std::fs;
use std::process;

enum Output {
    Yaml,
    Json,
    Highway,
}

fn usage() -> ! {
    eprintln!("Usage: chartread [--json|--highway] <notes.chart> [Track]");
    eprintln!("       Track defaults to ExpertSingle");
    process::exit(1);
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let mut output = Output::Yaml;
    let mut positional: Vec<String> = Vec::new();

    // Parse flags
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--yaml" => output = Output::Yaml,
            "--json" => output = Output::Json,
            "--highway" => output = Output::Highway,
            flag if flag.starts_with("--") => {
                eprintln!("Unknown flag '{}'", flag);
                usage();
            }
            _ => positional.push(arg),
        }
    }

    let input_path = match positional.first() {
        Some(path) => path,
        None => usage(),
    };
    let track = positional.get(1).map(String::as_str).unwrap_or("ExpertSingle");

    // Read input file
    let source = match fs::read_to_string(input_path) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", input_path, e);
            process::exit(1);
        }
    };

    let chart = match chartread::decode(&source, track) {
        Ok(chart) => chart,
        Err(e) => {
            eprintln!("Decoding error: {}", e);
            process::exit(1);
        }
    };

    let rendered = match output {
        Output::Yaml => serde_yaml::to_string(&chart).map_err(|e| e.to_string()),
        Output::Json => serde_json::to_string_pretty(&chart).map_err(|e| e.to_string()),
        Output::Highway => Ok(chartread::highway::render(&chart.chords)),
    };

    match rendered {
        Ok(text) => println!("{}", text),
        Err(e) => {
            eprintln!("Error serializing chart: {}", e);
            process::exit(1);
        }
    }

    eprintln!(
        "Decoded [{}]: {} notes, {} chords, {} phrases ({} diagnostics)",
        chart.track,
        chart.notes.len(),
        chart.chords.len(),
        chart.phrases.len(),
        chart.diagnostics.len()
    );
}
