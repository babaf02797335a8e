use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use glycotree_io::{
    CandidateEntry, ClassEntry, DEFAULT_URL, DataSource, Dataset, DatasetLoader, FeatureEntry,
    LoaderConfig, MedianImputer, Outcome, ParamsEntry, ReportWriter, RunReport, TreeShape,
};
use glycotree_tree::{
    ClassWeight, DecisionTreeConfig, Evaluation, GridSearch, GridSearchResult, ParamGrid,
    RankedFeature, SplitCriterion, StratifiedKFold, TrainTestSplit, evaluate, rank_importances,
    stratified_train_test_split,
};
use glycotree_viz::{
    IMPORTANCE_FILE, ROC_FILE, TREE_FILE, render_importances, render_roc, render_tree,
};

/// Bars drawn and rows printed for feature importances.
const TOP_FEATURES: usize = 10;

#[derive(Parser)]
#[command(name = "glycotree")]
#[command(about = "Tuned decision-tree diagnosis model for the Pima Indians diabetes data")]
#[command(version)]
struct Cli {
    /// URL of the headerless nine-column diabetes CSV
    #[arg(long, default_value = DEFAULT_URL)]
    url: String,

    /// Read a local CSV instead of fetching --url
    #[arg(long)]
    data: Option<PathBuf>,

    /// RNG seed for the split, CV folds and tree feature order
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Fraction of rows held out for evaluation
    #[arg(long, default_value_t = 0.2)]
    test_size: f64,

    /// Number of stratified cross-validation folds in the grid search
    #[arg(long, default_value_t = 5)]
    cv_folds: usize,

    /// Split quality criterion: "gini" or "entropy"
    #[arg(long, default_value = "gini")]
    criterion: String,

    /// Rows used to compute imputation medians: "full" or "train"
    #[arg(long, default_value = "full")]
    impute_scope: String,

    /// Output directory for plots and the JSON report
    #[arg(long, default_value = "glycotree-output")]
    output_dir: PathBuf,

    /// Skip rendering the SVG charts
    #[arg(long, default_value_t = false)]
    no_plots: bool,

    /// Deepest tree level drawn in the tree diagram (root is level 0)
    #[arg(long, default_value_t = 3)]
    plot_depth: usize,

    /// HTTP timeout in seconds when fetching --url
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImputeScope {
    Full,
    Train,
}

impl ImputeScope {
    fn name(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Train => "train",
        }
    }
}

fn parse_criterion(s: &str) -> Result<SplitCriterion> {
    match s {
        "gini" => Ok(SplitCriterion::Gini),
        "entropy" => Ok(SplitCriterion::Entropy),
        other => anyhow::bail!("unknown criterion: {other} (expected gini or entropy)"),
    }
}

fn parse_impute_scope(s: &str) -> Result<ImputeScope> {
    match s {
        "full" => Ok(ImputeScope::Full),
        "train" => Ok(ImputeScope::Train),
        other => anyhow::bail!("unknown impute scope: {other} (expected full or train)"),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Configure Rayon thread pool
    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    run(&cli)
}

fn run(cli: &Cli) -> Result<()> {
    let criterion = parse_criterion(&cli.criterion)?;
    let impute_scope = parse_impute_scope(&cli.impute_scope)?;

    // 1. Load
    let source = match &cli.data {
        Some(path) => DataSource::Local(path.clone()),
        None => DataSource::Remote(cli.url.clone()),
    };
    let loader = DatasetLoader::new(
        LoaderConfig::new().with_timeout(Duration::from_secs(cli.timeout_secs)),
    );
    let raw = loader
        .load(&source)
        .with_context(|| format!("failed to load dataset from {}", source.describe()))?;

    // 2. Split on labels; imputation never changes them.
    let labels = raw.labels();
    let split = stratified_train_test_split(&labels, cli.test_size, cli.seed)
        .context("failed to split dataset")?;
    info!(
        n_train = split.train.len(),
        n_test = split.test.len(),
        "train/test split"
    );

    // 3. Clean
    let imputer = match impute_scope {
        ImputeScope::Full => {
            let all: Vec<usize> = (0..raw.len()).collect();
            MedianImputer::fit(&raw, &all)
        }
        ImputeScope::Train => MedianImputer::fit(&raw, &split.train),
    };
    let dataset = imputer.transform(&raw);

    let features = dataset.feature_matrix();
    let feature_names = dataset.feature_names();
    let train_x = TrainTestSplit::select(&features, &split.train);
    let train_y = TrainTestSplit::select(&labels, &split.train);
    let test_x = TrainTestSplit::select(&features, &split.test);
    let test_y = TrainTestSplit::select(&labels, &split.test);

    // 4. Tune
    let base = DecisionTreeConfig::new()
        .with_criterion(criterion)
        .with_class_weight(ClassWeight::Balanced)
        .with_seed(cli.seed);
    let cv = StratifiedKFold::new(cli.cv_folds)
        .context("invalid --cv-folds")?
        .with_seed(cli.seed);
    let grid_search = GridSearch::new(base, ParamGrid::default()).with_cv(cv);
    info!(
        n_candidates = grid_search.grid().len(),
        n_folds = grid_search.cv().n_folds(),
        criterion = grid_search.base().criterion().name(),
        "grid search configured"
    );
    let search = grid_search
        .fit(&train_x, &train_y)
        .context("grid search failed")?;

    // 5. Evaluate
    let evaluation = evaluate(&search.best_estimator, &test_x, &test_y, &Outcome::CLASS_NAMES)
        .context("holdout evaluation failed")?;
    let ranked = rank_importances(&search.best_estimator.feature_importances(), &feature_names);

    print_summary(&search, &evaluation, &ranked);

    // 6. Visualize and record
    let writer = ReportWriter::new(&cli.output_dir).context("failed to prepare output directory")?;
    if !cli.no_plots {
        render_roc(
            &writer.artifact_path(ROC_FILE),
            &evaluation.roc,
            evaluation.roc_auc,
        )
        .context("failed to render ROC curve")?;
        render_tree(
            &writer.artifact_path(TREE_FILE),
            &search.best_estimator,
            &feature_names,
            &Outcome::CLASS_NAMES,
            cli.plot_depth,
        )
        .context("failed to render decision tree")?;
        render_importances(&writer.artifact_path(IMPORTANCE_FILE), &ranked, TOP_FEATURES)
            .context("failed to render feature importances")?;
    }

    let report = build_report(
        cli,
        &source,
        &dataset,
        &split,
        impute_scope,
        &imputer,
        &search,
        &evaluation,
        &ranked,
    );
    writer
        .write_report(&report)
        .context("failed to write run report")?;

    info!(output_dir = %cli.output_dir.display(), "pipeline complete");
    Ok(())
}

fn print_summary(search: &GridSearchResult, evaluation: &Evaluation, ranked: &[RankedFeature]) {
    let best = search.best();
    println!("Best parameters: {}", best.params);
    println!("Best CV ROC-AUC: {:.3}", best.mean_score);
    println!();
    println!("Accuracy: {:.3}", evaluation.accuracy);
    println!("ROC-AUC: {:.3}", evaluation.roc_auc);
    println!();
    println!("Confusion matrix:");
    print!("{}", evaluation.confusion);
    println!();
    println!("Classification report:");
    print!("{}", evaluation.report);
    println!();
    println!("Top {TOP_FEATURES} feature importances:");
    for feature in ranked.iter().take(TOP_FEATURES) {
        println!("{:>26}  {:.4}", feature.name, feature.importance);
    }
}

#[allow(clippy::too_many_arguments)]
fn build_report(
    cli: &Cli,
    source: &DataSource,
    dataset: &Dataset,
    split: &TrainTestSplit,
    impute_scope: ImputeScope,
    imputer: &MedianImputer,
    search: &GridSearchResult,
    evaluation: &Evaluation,
    ranked: &[RankedFeature],
) -> RunReport {
    let params_entry = |p: glycotree_tree::TreeParams| ParamsEntry {
        max_depth: p.max_depth,
        min_samples_leaf: p.min_samples_leaf,
    };
    let tree = &search.best_estimator;

    RunReport {
        source: source.describe(),
        n_records: dataset.len(),
        n_train: split.train.len(),
        n_test: split.test.len(),
        seed: cli.seed,
        criterion: tree.criterion().name().to_string(),
        impute_scope: impute_scope.name().to_string(),
        imputation_medians: imputer
            .medians()
            .map(|(name, m)| (name.to_string(), m))
            .collect::<BTreeMap<_, _>>(),
        cv_results: search
            .candidates
            .iter()
            .map(|c| CandidateEntry {
                params: params_entry(c.params),
                fold_scores: c.fold_scores.clone(),
                mean_score: c.mean_score,
                std_score: c.std_score,
                rank: c.rank,
            })
            .collect(),
        best_params: params_entry(search.best_params()),
        best_cv_roc_auc: search.best().mean_score,
        accuracy: evaluation.accuracy,
        roc_auc: evaluation.roc_auc,
        confusion_matrix: evaluation.confusion.as_rows().to_vec(),
        classes: evaluation
            .report
            .class_names()
            .iter()
            .zip(&evaluation.report.classes)
            .map(|(name, m)| ClassEntry {
                name: name.clone(),
                precision: m.precision,
                recall: m.recall,
                f1: m.f1,
                support: m.support,
            })
            .collect(),
        feature_importances: ranked
            .iter()
            .map(|f| FeatureEntry {
                name: f.name.clone(),
                importance: f.importance,
                rank: f.rank,
            })
            .collect(),
        tree: TreeShape {
            n_nodes: tree.n_nodes(),
            n_leaves: tree.n_leaves(),
            depth: tree.depth(),
        },
    }
}
