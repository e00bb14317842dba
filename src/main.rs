// pasta: Per-position variant symbol streams and conversion to and from gVCF and GFF.
//
// Copyright 2025 Tommi Mäklin [tommi@maklin.fi].
//
// Copyrights in this project are retained by contributors. No copyright assignment
// is required to contribute to this project.
//
// Except as otherwise noted (below and/or in individual files), this
// project is licensed under the Apache License, Version 2.0
// <LICENSE-APACHE> or <http://www.apache.org/licenses/LICENSE-2.0> or
// the MIT license, <LICENSE-MIT> or <http://opensource.org/licenses/MIT>,
// at your option.
//
use std::fs::File;
use std::io::BufReader;
use std::io::BufWriter;
use std::io::Cursor;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use clap::{CommandFactory, Parser};
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use log::{error, info};

use pasta::reference::Reference;
use pasta::{Format, Options};

mod cli;

type E = Box<dyn std::error::Error>;

/// Initializes the logger with verbosity given in `log_max_level`.
fn init_log(log_max_level: usize) {
    stderrlog::new()
    .module(module_path!())
    .quiet(false)
    .verbosity(log_max_level)
    .timestamp(stderrlog::Timestamp::Off)
    .init()
    .unwrap();
}

fn is_gz(path: &Path) -> bool {
    path.extension().is_some_and(|x| x == "gz")
}

/// Open `path` for reading, `-` is stdin. Gzipped files end in `.gz`.
fn open_input(path: &Path) -> Result<Box<dyn Read>, E> {
    if path == Path::new("-") {
        return Ok(Box::new(BufReader::new(std::io::stdin())))
    }
    let f = File::open(path).map_err(|err| format!("{}: {}", path.display(), err))?;
    if is_gz(path) {
        Ok(Box::new(MultiGzDecoder::new(BufReader::new(f))))
    } else {
        Ok(Box::new(BufReader::new(f)))
    }
}

/// Output file or stdout.
///
/// Must be closed with [finish](Output::finish) so that errors writing the
/// gzip trailer are reported.
///
enum Output {
    Plain(BufWriter<Box<dyn Write>>),
    Gz(GzEncoder<BufWriter<File>>),
}

impl Output {
    fn finish(self) -> std::io::Result<()> {
        match self {
            Output::Plain(mut conn) => conn.flush(),
            Output::Gz(conn) => conn.finish()?.flush(),
        }
    }
}

impl Write for Output {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            Output::Plain(conn) => conn.write(buf),
            Output::Gz(conn) => conn.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Output::Plain(conn) => conn.flush(),
            Output::Gz(conn) => conn.flush(),
        }
    }
}

/// Open `path` for writing, stdout if it is None or `-`.
fn open_output(path: Option<&PathBuf>) -> Result<Output, E> {
    match path {
        Some(path) if path != Path::new("-") => {
            let f = File::create(path).map_err(|err| format!("{}: {}", path.display(), err))?;
            if is_gz(path) {
                Ok(Output::Gz(GzEncoder::new(BufWriter::new(f), Compression::default())))
            } else {
                Ok(Output::Plain(BufWriter::new(Box::new(f))))
            }
        },
        _ => Ok(Output::Plain(BufWriter::new(Box::new(std::io::stdout())))),
    }
}

fn read_all(path: &Path) -> Result<Vec<u8>, E> {
    let mut bytes: Vec<u8> = Vec::new();
    open_input(path)?.read_to_end(&mut bytes)?;
    Ok(bytes)
}

/// Parse `format` or guess it from the first line of `bytes`.
fn input_format(format: &Option<String>, bytes: &[u8], path: &Path) -> Result<Format, E> {
    match format {
        Some(format) => Ok(format.parse::<Format>()?),
        None => {
            let guessed = pasta::guess_format(bytes).ok_or_else(|| format!("Could not guess the format of {}, use --format", path.display()))?;
            info!("Guessed {:?} input from {}", guessed, path.display());
            Ok(guessed)
        },
    }
}

fn run(command: &cli::Commands) -> Result<(), E> {
    match command {
        // Decode
        cli::Commands::Decode {
            input_files,
            out_file,
            format,
            ref_file,
            ploidy,
            chrom,
            no_nocall_seq,
            source,
            date,
            ..
        } => {
            let format = format.parse::<Format>()?;
            let reference = ref_file.as_ref().map(|file| Reference::from_fasta_path(file)).transpose()?;
            let options = Options {
                ploidy: *ploidy,
                nocall_sequence: !*no_nocall_seq,
                chrom: chrom.clone(),
                source: source.clone(),
                reference_name: ref_file.as_ref().map(|x| x.display().to_string()).unwrap_or("unknown".to_string()),
                date: date.clone(),
                ..Default::default()
            };

            let mut conn_in: Box<dyn Read> = if input_files.len() == 2 {
                let mut interleaved: Vec<u8> = Vec::new();
                pasta::stream::interleave(&mut open_input(&input_files[0])?, &mut open_input(&input_files[1])?, &mut interleaved, 0)?;
                Box::new(Cursor::new(interleaved))
            } else {
                open_input(&input_files[0])?
            };

            let mut conn_out = open_output(out_file.as_ref())?;
            pasta::decode_from_read_to_write(format, &options, reference.as_ref(), &mut conn_in, &mut conn_out)?;
            conn_out.finish()?;
        },

        // Encode
        cli::Commands::Encode {
            input_file,
            out_file,
            format,
            ref_file,
            ploidy,
            line_width,
            ..
        } => {
            let bytes = read_all(input_file)?;
            let format = input_format(format, &bytes, input_file)?;
            let reference = Reference::from_fasta_path(ref_file)?;
            let options = Options { ploidy: *ploidy, line_width: *line_width, ..Default::default() };

            let mut conn_out = open_output(out_file.as_ref())?;
            pasta::encode_from_read_to_write(format, &options, &reference, &mut Cursor::new(bytes), &mut conn_out)?;
            conn_out.finish()?;
        },

        // Convert
        cli::Commands::Convert {
            input_file,
            out_file,
            in_format,
            out_format,
            ref_file,
            ploidy,
            source,
            ..
        } => {
            let bytes = read_all(input_file)?;
            let in_format = input_format(in_format, &bytes, input_file)?;
            let out_format = out_format.parse::<Format>()?;
            let reference = Reference::from_fasta_path(ref_file)?;
            let options = Options {
                ploidy: *ploidy,
                source: source.clone(),
                reference_name: ref_file.display().to_string(),
                ..Default::default()
            };

            let mut conn_out = open_output(out_file.as_ref())?;
            pasta::convert_from_read_to_write(in_format, out_format, &options, &reference, &mut Cursor::new(bytes), &mut conn_out)?;
            conn_out.finish()?;
        },

        // Interleave
        cli::Commands::Interleave {
            input_files,
            out_file,
            line_width,
            ..
        } => {
            let mut conn_out = open_output(out_file.as_ref())?;
            pasta::stream::interleave(&mut open_input(&input_files[0])?, &mut open_input(&input_files[1])?, &mut conn_out, *line_width)?;
            conn_out.finish()?;
        },

        // Filter
        cli::Commands::Filter {
            input_file,
            out_file,
            start,
            length,
            ploidy,
            line_width,
            ..
        } => {
            let options = Options { ploidy: *ploidy, line_width: *line_width, ..Default::default() };
            let mut conn_out = open_output(out_file.as_ref())?;
            pasta::stream::filter(&mut open_input(input_file)?, &mut conn_out, *start, *length, &options)?;
            conn_out.finish()?;
        },
    }
    Ok(())
}

fn main() {
    let cli = cli::Cli::parse();

    let Some(command) = &cli.command else {
        let _ = cli::Cli::command().print_help();
        return
    };

    let verbose = match command {
        cli::Commands::Decode { verbose, .. } => *verbose,
        cli::Commands::Encode { verbose, .. } => *verbose,
        cli::Commands::Convert { verbose, .. } => *verbose,
        cli::Commands::Interleave { verbose, .. } => *verbose,
        cli::Commands::Filter { verbose, .. } => *verbose,
    };
    init_log(if verbose { 2 } else { 1 });

    if let Err(err) = run(command) {
        error!("{}", err);
        std::process::exit(1);
    }
}
