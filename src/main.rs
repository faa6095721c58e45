use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use graph_adjudicator::adjudicate::{
    run_region, AdjudicatorConfig, CountMeta, CountTable, PipelineConfig, Read, RunContext, Sample,
};
use graph_adjudicator::align::{AlignMode, ScoringParams};
use graph_adjudicator::graph::VariantGraph;
use graph_adjudicator::io::{fastq::FastqReader, vcf};
use graph_adjudicator::reference::InMemoryReference;
use graph_adjudicator::region::Region;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(
    name = "graph-adjudicator",
    author,
    version,
    about = "Attribute reads to variant alleles by aligning them to a variant graph",
    arg_required_else_help = true
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Local,
    SemiGlobal,
    Global,
}

impl From<ModeArg> for AlignMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Local => AlignMode::Local,
            ModeArg::SemiGlobal => AlignMode::SemiGlobal,
            ModeArg::Global => AlignMode::Global,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the variant graph for a region, align reads to it and count allele support
    Adjudicate {
        /// Reference FASTA file
        #[arg(short = 'r', long = "reference")]
        reference: String,
        /// Variant VCF file
        #[arg(long = "vcf")]
        vcf: String,
        /// Reads FASTQ file
        reads: String,
        /// Region as chr:start-end (1-based, inclusive) or a whole contig name
        #[arg(short = 'R', long = "region")]
        region: String,
        /// Sample name the reads are counted under
        #[arg(short = 's', long = "sample", default_value = "sample")]
        sample: String,
        #[arg(long = "read-group", default_value = "1")]
        read_group: String,
        /// Output count table (bincode)
        #[arg(short, long)]
        out: Option<String>,
        /// Write per-read alignment reports to this file
        #[arg(long = "report")]
        report: Option<String>,
        #[arg(long = "match", default_value_t = 1)]
        match_score: i32,
        #[arg(long = "mismatch", default_value_t = 4)]
        mismatch_penalty: i32,
        #[arg(long = "gap-open", default_value_t = 6)]
        gap_open: i32,
        #[arg(long = "gap-ext", default_value_t = 1)]
        gap_extend: i32,
        /// Alignment mode; local by default, use semi-global to force whole reads onto the graph
        #[arg(long = "mode", value_enum, default_value_t = ModeArg::Local)]
        mode: ModeArg,
        /// Maximum edits allowed on an allele node
        #[arg(long = "max-edits", default_value_t = 2)]
        max_edits: u32,
        /// Alternate alleles shorter than this must match exactly
        #[arg(long = "min-alt-len", default_value_t = 4)]
        min_alt_len: usize,
        /// Also align the reverse complement of every read
        #[arg(long = "both-strands")]
        both_strands: bool,
        #[arg(short = 't', long = "threads", default_value_t = 1)]
        threads: usize,
    },
    /// Print a saved count table as TSV
    Summary {
        /// Count table written by `adjudicate --out`
        table: String,
    },
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);
    match cli.command {
        Commands::Adjudicate {
            reference,
            vcf,
            reads,
            region,
            sample,
            read_group,
            out,
            report,
            match_score,
            mismatch_penalty,
            gap_open,
            gap_extend,
            mode,
            max_edits,
            min_alt_len,
            both_strands,
            threads,
        } => {
            let scoring = ScoringParams {
                match_score,
                mismatch_penalty,
                gap_open,
                gap_extend,
                mode: mode.into(),
            };
            let pipeline = PipelineConfig {
                threads,
                buffers: 0,
                adjudicator: AdjudicatorConfig {
                    max_edits,
                    min_alt_length_for_partial: min_alt_len,
                    align_both_strands: both_strands,
                    collect_reports: report.is_some(),
                },
            };
            let files = InputFiles {
                reference: &reference,
                vcf: &vcf,
                reads: &reads,
            };
            let outputs = OutputFiles {
                counts: out.as_deref(),
                reports: report.as_deref(),
            };
            let sample = Arc::new(Sample::new(sample, read_group));
            run_adjudicate(files, outputs, &region, sample, scoring, pipeline)
        }
        Commands::Summary { table } => run_summary(&table),
    }
}

struct InputFiles<'a> {
    reference: &'a str,
    vcf: &'a str,
    reads: &'a str,
}

struct OutputFiles<'a> {
    counts: Option<&'a str>,
    reports: Option<&'a str>,
}

fn open(path: &str, what: &str) -> Result<BufReader<File>> {
    let fh = File::open(path)
        .map_err(|e| anyhow::anyhow!("cannot open {} '{}': {}", what, path, e))?;
    Ok(BufReader::new(fh))
}

fn run_adjudicate(
    files: InputFiles<'_>,
    outputs: OutputFiles<'_>,
    region: &str,
    sample: Arc<Sample>,
    scoring: ScoringParams,
    pipeline: PipelineConfig,
) -> Result<()> {
    let reference = InMemoryReference::from_fasta(open(files.reference, "reference FASTA")?)
        .with_context(|| format!("reading reference '{}'", files.reference))?;
    if reference.contig_names().is_empty() {
        anyhow::bail!("FASTA file '{}' contains no sequences", files.reference);
    }

    let contig = region.rsplit_once(':').map_or(region, |(name, _)| name);
    let contig_len = reference.contig_len(contig).map(|l| l as u32);
    let region = Region::parse(region, contig_len)
        .ok_or_else(|| anyhow::anyhow!("invalid region '{}'", region))?;

    let variants = vcf::read_variants(open(files.vcf, "VCF")?)
        .with_context(|| format!("reading variants from '{}'", files.vcf))?;
    let mut cursor = variants.cursor_for(&region);
    let graph = VariantGraph::build(&reference, &mut cursor, &region, scoring)
        .with_context(|| format!("building graph for {}", region))?;
    log::info!(
        "graph for {}: {} nodes, {} variants",
        region,
        graph.len(),
        graph.variants().len()
    );

    let mut fastq = FastqReader::new(open(files.reads, "reads FASTQ")?);
    let mut reads: Vec<Read> = Vec::new();
    while let Some(rec) = fastq
        .next_record()
        .with_context(|| format!("reading '{}'", files.reads))?
    {
        reads.push(rec.into_read(Arc::clone(&sample)));
    }

    let ctx = RunContext::new(pipeline.adjudicator);
    run_region(&graph, &reads, &ctx, &pipeline)?;
    let (summary, sink) = ctx.finish();

    if let Some(p) = outputs.reports {
        let fh = File::create(p)
            .map_err(|e| anyhow::anyhow!("cannot create report '{}': {}", p, e))?;
        let mut w = BufWriter::new(fh);
        let n = sink.drain(&mut w)?;
        w.flush()?;
        log::info!("wrote {} reports to {}", n, p);
    }

    let mut table = CountTable::from_variants(graph.variants());
    table.set_meta(CountMeta {
        region: Some(region.to_string()),
        reference_file: Some(files.reference.to_string()),
        variant_file: Some(files.vcf.to_string()),
        command: Some(std::env::args().collect::<Vec<_>>().join(" ")),
        created: Some(chrono::Utc::now().to_rfc3339()),
    });
    if let Some(p) = outputs.counts {
        table
            .save_to_file(p)
            .map_err(|e| anyhow::anyhow!("cannot write count table to '{}': {}", p, e))?;
        log::info!("count table saved: {}", p);
    }

    println!("region: {}", region);
    println!("nodes: {}", graph.len());
    let skipped = if graph.has_skipped() {
        " (some skipped)"
    } else {
        ""
    };
    println!("variants: {}{}", graph.variants().len(), skipped);
    println!("reads: {}", summary.reads);
    println!("aligned: {}", summary.aligned);
    println!("failed: {}", summary.failed);
    println!("supporting: {}", summary.supporting);

    let stdout = std::io::stdout();
    let mut w = BufWriter::new(stdout.lock());
    table.write_tsv(&mut w)?;
    w.flush()?;
    Ok(())
}

fn run_summary(path: &str) -> Result<()> {
    let table = CountTable::load_from_file(path)?;
    let meta = &table.meta;
    let show = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
    println!("region: {}", show(&meta.region));
    println!("reference: {}", show(&meta.reference_file));
    println!("variants: {}", show(&meta.variant_file));
    println!("created: {}", show(&meta.created));
    println!("command: {}", show(&meta.command));

    let stdout = std::io::stdout();
    let mut w = BufWriter::new(stdout.lock());
    table.write_tsv(&mut w)?;
    w.flush()?;
    Ok(())
}
