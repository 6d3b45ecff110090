//! kiln — configurable CNN image-classifier training CLI.
//!
//! `kiln train` wires together the MNIST dataset, the LeNet-5 network, the
//! NLL loss, an optimizer, and the mini-batch training loop, driven entirely
//! by an `AppConfig` that can come from a JSON file with per-field command
//! line overrides. `kiln classify` runs a saved model on an image file.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

use kiln::config::AppConfig;
use kiln::data::image;
use kiln::data::loader::DataLoader;
use kiln::data::mnist::{MnistDataset, Split, N_CLASSES};
use kiln::error::KilnError;
use kiln::network::lenet::lenet5;
use kiln::network::metadata::InputType;
use kiln::network::network::Network;
use kiln::network::spec::NetworkSpec;
use kiln::train::train_config::TrainConfig;
use kiln::train::trainer::{argmax, evaluate, train_loop};

#[derive(Parser)]
#[command(name = "kiln", version, about = "Train and run a LeNet-5 image classifier")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Train the LeNet-5 classifier on MNIST.
    Train(TrainArgs),
    /// Classify an image file with a trained model.
    Classify(ClassifyArgs),
}

#[derive(Args)]
struct TrainArgs {
    /// JSON configuration file; defaults apply for any missing field.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory containing the MNIST IDX files.
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Learning rate override.
    #[arg(long)]
    lr: Option<f64>,
    /// Mini-batch size override.
    #[arg(long)]
    batch_size: Option<usize>,
    /// Epoch count override.
    #[arg(long)]
    epochs: Option<usize>,
    /// Step-logging frequency override (0 disables step logging).
    #[arg(long)]
    log_every: Option<usize>,
    /// Where to write the trained model weights; the architecture spec goes
    /// to the same stem with a `.spec.json` extension.
    #[arg(long, default_value = "lenet5.json")]
    out: PathBuf,
    /// Skip the test-split evaluation after training.
    #[arg(long)]
    no_eval: bool,
}

#[derive(Args)]
struct ClassifyArgs {
    /// Trained model weights (written by `kiln train`).
    #[arg(long)]
    model: PathBuf,
    /// Architecture spec; defaults to the model path with a `.spec.json`
    /// extension.
    #[arg(long)]
    spec: Option<PathBuf>,
    /// Image file to classify (PNG/JPEG/BMP/GIF).
    image: PathBuf,
}

fn main() -> ExitCode {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Train(args) => run_train(args),
        Command::Classify(args) => run_classify(args),
    };

    if let Err(e) = result {
        log::error!("{e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn run_train(args: TrainArgs) -> Result<(), KilnError> {
    let mut cfg = match &args.config {
        Some(path) => AppConfig::load_json(path)?,
        None => AppConfig::default(),
    };
    if let Some(dir) = args.data_dir {
        cfg.dataset.dir = dir;
    }
    if let Some(lr) = args.lr {
        cfg.optimizer.lr = lr;
    }
    if let Some(batch_size) = args.batch_size {
        cfg.loader.batch_size = batch_size;
    }
    if let Some(epochs) = args.epochs {
        cfg.epochs = epochs;
    }
    if let Some(log_every) = args.log_every {
        cfg.log_every = log_every;
    }

    // Show the effective configuration — every value here can be changed
    // from the config file or the command line.
    println!("{}", "=".repeat(80));
    println!("{}", cfg.name);
    println!("{}", "=".repeat(80));
    println!("{}", cfg.pretty()?);

    log::info!("loading MNIST training split from {}", cfg.dataset.dir.display());
    let train = MnistDataset::load(
        &cfg.dataset.dir,
        Split::Train,
        cfg.dataset.width,
        cfg.dataset.height,
    )?;
    log::info!(
        "{} training samples at {}×{}",
        train.len(),
        cfg.dataset.width,
        cfg.dataset.height
    );

    // The canonical preset targets 32×32; honor a different configured
    // resolution and let spec validation reject geometries LeNet-5 cannot
    // take.
    let mut spec = lenet5(N_CLASSES);
    spec.input_shape = (1, cfg.dataset.height as usize, cfg.dataset.width as usize);
    if let Some(metadata) = spec.metadata.as_mut() {
        metadata.input_type = Some(InputType::ImageGrayscale {
            width: cfg.dataset.width,
            height: cfg.dataset.height,
        });
    }
    let mut network = spec.build()?;
    let mut optimizer = cfg.build_optimizer();
    let loader = DataLoader::new(cfg.loader.batch_size, cfg.loader.shuffle);
    let train_cfg = TrainConfig::new(cfg.epochs, spec.loss, cfg.log_every);

    log::info!(
        "training {} for {} epoch(s), batch size {}, lr {}",
        spec.name,
        cfg.epochs,
        cfg.loader.batch_size,
        optimizer.learning_rate()
    );

    let final_loss = train_loop(
        &mut network,
        &train.images,
        &train.labels,
        None,
        None,
        &loader,
        &mut optimizer,
        &train_cfg,
    )?;
    log::info!("final training loss: {final_loss:.6}");

    network.save_json(&args.out)?;
    let spec_path = spec_path_for(&args.out);
    spec.save_json(&spec_path)?;
    log::info!("model saved to {} (spec: {})", args.out.display(), spec_path.display());

    if !args.no_eval {
        log::info!("evaluating on the test split");
        let test = MnistDataset::load(
            &cfg.dataset.dir,
            Split::Test,
            cfg.dataset.width,
            cfg.dataset.height,
        )?;
        let metrics = evaluate(&mut network, &test.images, &test.labels, spec.loss);
        log::info!(
            "test loss {:.6}, test accuracy {:.2}% ({} samples)",
            metrics.loss,
            metrics.accuracy * 100.0,
            test.len()
        );
    }

    Ok(())
}

fn run_classify(args: ClassifyArgs) -> Result<(), KilnError> {
    let spec_path = args.spec.unwrap_or_else(|| spec_path_for(&args.model));
    let spec = NetworkSpec::load_json(&spec_path)?;
    let mut network = Network::load_json(&args.model)?;

    let bytes = std::fs::read(&args.image)?;
    let input = match spec.metadata.as_ref().and_then(|m| m.input_type.as_ref()) {
        Some(InputType::ImageRgb { width, height }) => image::rgb_input(&bytes, *width, *height)?,
        Some(InputType::ImageGrayscale { width, height }) => {
            image::grayscale_input(&bytes, *width, *height)?
        }
        // No metadata: fall back to the spec's input shape, grayscale.
        _ => {
            let (_, h, w) = spec.input_shape;
            image::grayscale_input(&bytes, w as u32, h as u32)?
        }
    };

    let output = network.forward(&input);
    let predicted = argmax(&output);
    let label = spec
        .metadata
        .as_ref()
        .and_then(|m| m.output_labels.as_ref())
        .and_then(|labels| labels.get(predicted).cloned())
        .unwrap_or_else(|| predicted.to_string());

    println!("predicted: {label}");
    if spec.loss == kiln::LossType::Nll {
        // Log-probabilities exponentiate to a confidence.
        println!("confidence: {:.2}%", output[predicted].exp() * 100.0);
    }

    Ok(())
}

/// `lenet5.json` → `lenet5.spec.json`, next to the weights.
fn spec_path_for(model: &Path) -> PathBuf {
    model.with_extension("spec.json")
}
