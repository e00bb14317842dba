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
use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    // Decode a symbol stream
    Decode {
        // Input symbol stream(s), two single-track streams are interleaved
        #[arg(group = "input", required = true, num_args = 1..=2, help = "Input file(s)")]
        input_files: Vec<PathBuf>,

        // Output file path
        #[arg(short = 'o', long = "output", required = false)]
        out_file: Option<PathBuf>,

        // Output format, defaults to gVCF
        #[arg(long = "format", default_value = "vcf")]
        format: String,

        // Fasta file used to spell out run-length blocks
        #[arg(short = 'r', long = "reference", required = false)]
        ref_file: Option<PathBuf>,

        // Number of tracks per position
        #[arg(short = 'p', long = "ploidy", default_value_t = 2)]
        ploidy: usize,

        // Chromosome name used until the stream names one
        #[arg(long = "chrom", default_value = "unk")]
        chrom: String,

        // Write no-call records as reference blocks
        #[arg(long = "no-nocall-seq", default_value_t = false)]
        no_nocall_seq: bool,

        // Source written to the header
        #[arg(long = "source", default_value = "unknown")]
        source: String,

        // Date written to the header
        #[arg(long = "date", required = false)]
        date: Option<String>,

        // Verbosity
        #[arg(long = "verbose", default_value_t = false)]
        verbose: bool,
    },

    // Encode gVCF or GFF as a symbol stream
    Encode {
        // Input file
        #[arg(group = "input", required = true, help = "Input file")]
        input_file: PathBuf,

        // Output file path
        #[arg(short = 'o', long = "output", required = false)]
        out_file: Option<PathBuf>,

        // Input format, guessed from the first line if not given
        #[arg(long = "format", required = false)]
        format: Option<String>,

        // Fasta file the records were called against
        #[arg(short = 'r', long = "reference", required = true)]
        ref_file: PathBuf,

        // Number of tracks per position
        #[arg(short = 'p', long = "ploidy", default_value_t = 2)]
        ploidy: usize,

        // Symbols per line, 0 for a single line
        #[arg(long = "line-width", default_value_t = 50)]
        line_width: usize,

        // Verbosity
        #[arg(long = "verbose", default_value_t = false)]
        verbose: bool,
    },

    // Convert between supported formats
    Convert {
        // Input file
        #[arg(group = "input", required = true, help = "Input file")]
        input_file: PathBuf,

        // Output file path
        #[arg(short = 'o', long = "output", required = false)]
        out_file: Option<PathBuf>,

        // Input format, guessed from the first line if not given
        #[arg(long = "from", required = false)]
        in_format: Option<String>,

        // Output format
        #[arg(long = "to", required = true)]
        out_format: String,

        // Fasta file the records were called against
        #[arg(short = 'r', long = "reference", required = true)]
        ref_file: PathBuf,

        // Number of tracks per position
        #[arg(short = 'p', long = "ploidy", default_value_t = 2)]
        ploidy: usize,

        // Source written to the header
        #[arg(long = "source", default_value = "unknown")]
        source: String,

        // Verbosity
        #[arg(long = "verbose", default_value_t = false)]
        verbose: bool,
    },

    // Interleave two single-track symbol streams
    Interleave {
        // Input files
        #[arg(group = "input", required = true, num_args = 2, help = "Input files")]
        input_files: Vec<PathBuf>,

        // Output file path
        #[arg(short = 'o', long = "output", required = false)]
        out_file: Option<PathBuf>,

        // Symbols per line, 0 for a single line
        #[arg(long = "line-width", default_value_t = 50)]
        line_width: usize,

        // Verbosity
        #[arg(long = "verbose", default_value_t = false)]
        verbose: bool,
    },

    // Extract a window of reference positions
    Filter {
        // Input file
        #[arg(group = "input", required = true, help = "Input file")]
        input_file: PathBuf,

        // Output file path
        #[arg(short = 'o', long = "output", required = false)]
        out_file: Option<PathBuf>,

        // First position to keep, 0-based
        #[arg(short = 's', long = "start", required = true)]
        start: u64,

        // Number of positions to keep
        #[arg(short = 'n', long = "length", required = true)]
        length: u64,

        // Number of tracks per position
        #[arg(short = 'p', long = "ploidy", default_value_t = 2)]
        ploidy: usize,

        // Symbols per line, 0 for a single line
        #[arg(long = "line-width", default_value_t = 50)]
        line_width: usize,

        // Verbosity
        #[arg(long = "verbose", default_value_t = false)]
        verbose: bool,
    },
}
