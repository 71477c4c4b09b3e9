use std::env;
use std::path::{Path, PathBuf};

use log::{error, info};

use huffpack::paths::{COMPRESSED_SUFFIX, decompressed_path};

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        error!("Usage: {} <input_file> [output_file]", args[0]);
        eprintln!("  📂 <input_file>:  path to the encoded file.");
        eprintln!("  💾 [output_file]: path to write the decoded output.");
        eprintln!("                   Defaults to <input_file> without its .{COMPRESSED_SUFFIX} suffix.");
        std::process::exit(1);
    }

    let input_filepath = Path::new(&args[1]);
    let output_filepath: PathBuf = match args.get(2) {
        Some(path) => PathBuf::from(path),
        None => match decompressed_path(input_filepath) {
            Some(path) => path,
            None => {
                error!(
                    "{} has no .{} suffix, pass an output file explicitly",
                    input_filepath.display(),
                    COMPRESSED_SUFFIX
                );
                std::process::exit(1);
            }
        },
    };

    info!("--- Start Decoding ---");

    let stats = match huffpack::decode_file(input_filepath, &output_filepath) {
        Ok(stats) => stats,
        Err(e) => {
            error!("Decoding failed: {}", e);
            std::process::exit(1);
        }
    };

    println!(
        "\r\n✅ decoding successful.\n\
         📂 input file:        {} ({} bytes)\n\
         💾 output file:       {} ({} bytes)\n\
         🔣 symbols:           {}",
        input_filepath.display(),
        stats.input_bytes,
        output_filepath.display(),
        stats.output_bytes,
        stats.distinct_symbols
    );

    info!("--- End ---");
}
