use career_rag_context::{
    DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, Document, WindowChunker, WindowConfig,
    load_documents,
};
use clap::Parser;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

/// Chunk documents into overlapping windows and print them as JSON.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a single input file. If neither this nor --dir is given, reads from stdin.
    #[arg(short, long, conflicts_with = "dir")]
    input: Option<PathBuf>,

    /// Chunk every regular file directly inside this folder.
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// Source name recorded for stdin input.
    #[arg(short, long, default_value = "stdin")]
    source: String,

    /// Window width in characters.
    #[arg(short = 'w', long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Characters shared by consecutive windows.
    #[arg(short, long, default_value_t = DEFAULT_CHUNK_OVERLAP)]
    overlap: usize,
}

fn main() -> io::Result<()> {
    let args = Args::parse();

    let config = WindowConfig::new(args.chunk_size, args.overlap)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let chunker = WindowChunker::new(config);

    let documents = if let Some(dir) = args.dir {
        load_documents(&dir)?
    } else if let Some(input) = args.input {
        let source = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| input.display().to_string());
        vec![Document::new(source, fs::read_to_string(&input)?)]
    } else {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        vec![Document::new(args.source, buffer)]
    };

    let chunks = chunker.chunk_documents(&documents);
    let json_output = serde_json::to_string_pretty(&chunks)?;
    println!("{json_output}");

    Ok(())
}
