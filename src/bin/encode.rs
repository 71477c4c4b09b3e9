use std::env;
use std::path::{Path, PathBuf};

use log::{error, info};

use huffpack::entropy_from_freq;
use huffpack::paths::compressed_path;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        error!("Usage: {} <input_file> [output_file]", args[0]);
        eprintln!("  📂 <input_file>:  path to the file to encode.");
        eprintln!("  💾 [output_file]: where to write it, defaults to <input_file>.huff.");
        std::process::exit(1);
    }

    let input_filepath = Path::new(&args[1]);
    let output_filepath: PathBuf = match args.get(2) {
        Some(path) => PathBuf::from(path),
        None => compressed_path(input_filepath),
    };

    info!("--- Start Encoding ---");

    let stats = match huffpack::encode_file(input_filepath, &output_filepath) {
        Ok(stats) => stats,
        Err(e) => {
            error!("Encoding failed: {}", e);
            std::process::exit(1);
        }
    };

    println!(
        "\r\n✅ Encoding successful.\n\
         📂  Input:       {} ({} bytes)\n\
         💾  Output:      {} ({} bytes)\n\
         🔣  Symbols:     {}\n\
         ℹ️  Entropy:     {:.4} bits/symbol\n\
         🗜️  Ratio:       {:.4}%",
        input_filepath.display(),
        stats.input_bytes,
        output_filepath.display(),
        stats.output_bytes,
        stats.distinct_symbols,
        entropy_from_freq(&stats.frequencies),
        stats.ratio()
    );

    info!("--- End ---");
}
