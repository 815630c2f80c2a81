use clap::Parser;
use matchedfilter::lowlevel::ChannelView;
use matchedfilter::{
    detect_all, extract_waveforms, ComputeReport, CorrelationEngine, DetectConfig, Detection,
    EngineConfig, TemplateBank, Threshold,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "Matched-filter CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ThresholdConfig {
    Mad(f32),
    Absolute(f32),
}

impl From<ThresholdConfig> for Threshold {
    fn from(value: ThresholdConfig) -> Self {
        match value {
            ThresholdConfig::Mad(factor) => Threshold::Mad(factor),
            ThresholdConfig::Absolute(value) => Threshold::Absolute(value),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct EngineConfigJson {
    parallel: bool,
    offset_chunk: usize,
}

impl Default for EngineConfigJson {
    fn default() -> Self {
        let cfg = EngineConfig::default();
        Self {
            parallel: cfg.parallel,
            offset_chunk: cfg.offset_chunk,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct DetectConfigJson {
    enabled: bool,
    threshold: ThresholdConfig,
    min_separation: usize,
    max_detections: Option<usize>,
}

impl Default for DetectConfigJson {
    fn default() -> Self {
        let cfg = DetectConfig::default();
        let threshold = match cfg.threshold {
            Threshold::Mad(factor) => ThresholdConfig::Mad(factor),
            Threshold::Absolute(value) => ThresholdConfig::Absolute(value),
        };
        Self {
            enabled: true,
            threshold,
            min_separation: cfg.min_separation,
            max_detections: cfg.max_detections,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    dataset_path: String,
    output_path: Option<String>,
    step: usize,
    /// Output length per template; derived from the moveouts when absent.
    n_corr: Option<usize>,
    include_cc: bool,
    /// Attach the `[station][component][sample]` data window to each detection.
    include_waveforms: bool,
    engine: EngineConfigJson,
    detect: DetectConfigJson,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dataset_path: String::new(),
            output_path: None,
            step: 1,
            n_corr: None,
            include_cc: false,
            include_waveforms: false,
            engine: EngineConfigJson::default(),
            detect: DetectConfigJson::default(),
        }
    }
}

/// Flat buffers plus station metadata, as written by the preprocessing step.
#[derive(Debug, Deserialize)]
struct Dataset {
    n_stations: usize,
    n_components: usize,
    n_samples_template: usize,
    templates: Vec<f32>,
    moveouts: Vec<i32>,
    data: Vec<f32>,
    weights: Vec<f32>,
    #[serde(default)]
    sum_square_templates: Option<Vec<f32>>,
    #[serde(default)]
    stations: Vec<String>,
    #[serde(default)]
    components: Vec<String>,
    #[serde(default)]
    sampling_rate: Option<f64>,
}

#[derive(Debug, Serialize)]
struct ReportRecord {
    n_templates: usize,
    n_samples_data: usize,
    n_corr: usize,
    n_valid: usize,
    max_moveout: usize,
    invalid_moveouts: usize,
    skipped_channels: usize,
}

impl ReportRecord {
    fn new(report: ComputeReport, n_templates: usize, n_samples_data: usize) -> Self {
        Self {
            n_templates,
            n_samples_data,
            n_corr: report.n_corr,
            n_valid: report.n_valid,
            max_moveout: report.max_moveout,
            invalid_moveouts: report.invalid_moveouts,
            skipped_channels: report.skipped_channels,
        }
    }
}

#[derive(Debug, Serialize)]
struct DetectionRecord {
    template: usize,
    offset_idx: usize,
    sample: usize,
    time_s: Option<f64>,
    score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    waveforms: Option<Vec<Vec<Vec<f32>>>>,
}

impl DetectionRecord {
    fn new(det: Detection, sampling_rate: Option<f64>) -> Self {
        Self {
            template: det.template_idx,
            offset_idx: det.offset_idx,
            sample: det.sample,
            time_s: sampling_rate.map(|sr| det.sample as f64 / sr),
            score: det.score,
            waveforms: None,
        }
    }

    fn with_waveforms(mut self, flat: &[f32], n_components: usize, n_samples: usize) -> Self {
        if n_components > 0 && n_samples > 0 {
            let nested = flat
                .chunks(n_components * n_samples)
                .map(|station| station.chunks(n_samples).map(<[f32]>::to_vec).collect())
                .collect();
            self.waveforms = Some(nested);
        }
        self
    }
}

#[derive(Debug, Serialize)]
struct Output {
    stations: Vec<String>,
    components: Vec<String>,
    sampling_rate: Option<f64>,
    report: ReportRecord,
    detections: Vec<DetectionRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cc_sum: Option<Vec<Vec<f32>>>,
}

/// Multiplies two sizes read from JSON, failing instead of wrapping.
fn checked_size(a: usize, b: usize, what: &str) -> Result<usize, String> {
    a.checked_mul(b).ok_or_else(|| format!("{what} overflows usize"))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive("matchedfilter=info".parse()?),
            )
            .with_target(false)
            .init();
    }

    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.dataset_path.is_empty() {
        return Err("dataset_path must be set in the config".into());
    }
    if config.step == 0 {
        return Err("step must be at least 1".into());
    }

    let dataset_text = fs::read_to_string(&config.dataset_path)?;
    let dataset: Dataset = serde_json::from_str(&dataset_text)?;

    let n_channels = checked_size(
        dataset.n_stations,
        dataset.n_components,
        "n_stations * n_components",
    )?;
    if n_channels == 0 || dataset.data.len() % n_channels != 0 {
        return Err("data length must be a multiple of n_stations * n_components".into());
    }
    let n_samples_data = dataset.data.len() / n_channels;

    let mut bank = TemplateBank::new(
        dataset.templates,
        dataset.moveouts,
        dataset.weights,
        dataset.n_stations,
        dataset.n_components,
        dataset.n_samples_template,
    )?;
    if let Some(sums) = dataset.sum_square_templates {
        bank = bank.with_sum_square(sums)?;
    }
    tracing::info!(
        n_templates = bank.n_templates(),
        n_stations = bank.n_stations(),
        n_components = bank.n_components(),
        n_samples_data,
        "dataset loaded"
    );

    let n_corr = config
        .n_corr
        .unwrap_or_else(|| bank.correlation_len(n_samples_data, config.step));
    let n_templates = bank.n_templates();
    let cc_len = checked_size(n_templates, n_corr, "n_templates * n_corr")?;
    let mut cc_out = vec![0.0f32; cc_len];

    let engine = CorrelationEngine::new(EngineConfig {
        parallel: config.engine.parallel,
        offset_chunk: config.engine.offset_chunk,
    });
    let inputs = bank.inputs(&dataset.data, n_samples_data, n_corr);
    let report = engine.compute(&inputs, config.step, &mut cc_out)?;

    let detections = if config.detect.enabled {
        let detect_cfg = DetectConfig {
            threshold: config.detect.threshold.into(),
            min_separation: config.detect.min_separation,
            max_detections: config.detect.max_detections,
        };
        detect_all(
            &cc_out,
            n_templates,
            n_corr,
            report.n_valid,
            config.step,
            &detect_cfg,
        )?
    } else {
        Vec::new()
    };

    let cc_sum: Option<Vec<Vec<f32>>> = if config.include_cc && n_corr > 0 {
        Some(cc_out.chunks(n_corr).map(<[f32]>::to_vec).collect())
    } else {
        None
    };

    let data_view = ChannelView::new(&dataset.data, n_channels, n_samples_data, "data")?;
    let mut records = Vec::with_capacity(detections.len());
    for det in detections {
        let record = DetectionRecord::new(det, dataset.sampling_rate);
        let record = if config.include_waveforms {
            let flat = extract_waveforms(
                &data_view,
                &det,
                bank.moveouts(),
                bank.n_samples_template(),
            )?;
            record.with_waveforms(&flat, bank.n_components(), bank.n_samples_template())
        } else {
            record
        };
        records.push(record);
    }

    let output = Output {
        stations: dataset.stations,
        components: dataset.components,
        sampling_rate: dataset.sampling_rate,
        report: ReportRecord::new(report, n_templates, n_samples_data),
        detections: records,
        cc_sum,
    };
    let json = serde_json::to_string_pretty(&output)?;

    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
