//! Melbourne housing price pipeline.
//!
//! Runs on a CSV export of the Melbourne housing snapshot when a path is
//! given, and on a small synthetic sample otherwise:
//!
//! ```text
//! cargo run --example melbourne_pipeline -- melb_data.csv experiment.json
//! RUST_LOG=debug cargo run --example melbourne_pipeline
//! ```

use machinelearne_pipeline::{
    config::ExperimentConfig,
    metrics::{mean_absolute_error, ScoreSummary},
    model::RandomForestRegressor,
    model_selection::{CrossValidator, KFold, TrainTestSplit},
    pipeline::Pipeline,
    preprocessing::{ColumnRouter, OneHotEncoder, SimpleImputer},
    table::{read_csv, Column, Schema, Table},
    Result,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const TARGET: &str = "Price";

fn schema() -> Schema {
    Schema::new()
        .numeric("Rooms")
        .numeric("Distance")
        .numeric("Bathroom")
        .numeric("Car")
        .numeric("Landsize")
        .numeric("BuildingArea")
        .numeric("YearBuilt")
        .categorical("Type")
        .categorical("Method")
        .categorical("Regionname")
        .categorical("Suburb")
        .numeric(TARGET)
}

fn synthetic_sample(n_rows: usize) -> Result<Table> {
    const TYPES: [&str; 3] = ["h", "u", "t"];
    const METHODS: [&str; 4] = ["S", "SP", "PI", "VB"];
    const REGIONS: [&str; 3] = [
        "Northern Metropolitan",
        "Southern Metropolitan",
        "Western Metropolitan",
    ];

    let mut rng = ChaCha8Rng::seed_from_u64(2018);
    let mut numeric: Vec<Vec<Option<f64>>> = vec![Vec::with_capacity(n_rows); 7];
    let mut categorical: Vec<Vec<Option<String>>> = vec![Vec::with_capacity(n_rows); 4];
    let mut price = Vec::with_capacity(n_rows);

    for _ in 0..n_rows {
        let rooms = rng.random_range(1..6) as f64;
        let distance = rng.random_range(1.0..25.0);
        let bathroom = (rooms / 2.0).ceil();
        let car = rng.random_range(0..3) as f64;
        let landsize = rng.random_range(100.0..900.0);
        let area = 40.0 * rooms + rng.random_range(0.0..60.0);
        let year = rng.random_range(1900..2018) as f64;
        let kind = rng.random_range(0..TYPES.len());
        let region = rng.random_range(0..REGIONS.len());
        let suburb = rng.random_range(0..40);

        price.push(Some(
            250_000.0 * rooms + 400.0 * landsize - 20_000.0 * distance
                + 150_000.0 * (region == 1) as u8 as f64
                - 100_000.0 * kind as f64,
        ));

        let values = [rooms, distance, bathroom, car, landsize, area, year];
        let gap = [0.0, 0.0, 0.0, 0.05, 0.0, 0.45, 0.4];
        for ((column, value), p) in numeric.iter_mut().zip(values).zip(gap) {
            column.push((rng.random::<f64>() >= p).then_some(value));
        }
        categorical[0].push(Some(TYPES[kind].to_string()));
        categorical[1].push(Some(METHODS[rng.random_range(0..METHODS.len())].to_string()));
        categorical[2].push((rng.random::<f64>() >= 0.02).then(|| REGIONS[region].to_string()));
        categorical[3].push(Some(format!("Suburb{suburb}")));
    }

    let names = [
        "Rooms", "Distance", "Bathroom", "Car", "Landsize", "BuildingArea", "YearBuilt",
    ];
    let mut table = Table::new();
    for (name, values) in names.into_iter().zip(numeric) {
        table.push_column(name, Column::numeric(values))?;
    }
    for (name, values) in ["Type", "Method", "Regionname", "Suburb"]
        .into_iter()
        .zip(categorical)
    {
        table.push_column(name, Column::categorical(values))?;
    }
    table.push_column(TARGET, Column::numeric(price))?;
    Ok(table)
}

fn build_pipeline(config: &ExperimentConfig, x: &Table) -> Result<Pipeline> {
    let numeric = x.numeric_column_names();
    let categorical = x.low_cardinality_categorical(config.max_categories);

    let categorical_steps = Pipeline::new()
        .add_transformer(
            "impute",
            SimpleImputer::from_config(config.categorical_imputer.clone()),
        )?
        .add_transformer("onehot", OneHotEncoder::from_config(config.encoder.clone()))?;
    let preprocessor = ColumnRouter::new()
        .add_group(
            "num",
            SimpleImputer::from_config(config.numeric_imputer.clone()),
            &numeric,
        )?
        .add_group("cat", categorical_steps, &categorical)?;

    Pipeline::new()
        .add_transformer("preprocessor", preprocessor)?
        .add_estimator(
            "model",
            RandomForestRegressor::from_config(config.forest.clone()),
        )
}

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let data = match args.next() {
        Some(path) => read_csv(path, &schema())?,
        None => synthetic_sample(400)?,
    };
    let config = match args.next() {
        Some(path) => ExperimentConfig::from_json_file(path)?,
        None => ExperimentConfig::default(),
    };

    let (x, y) = data.split_target(TARGET)?;
    println!("Loaded {} rows x {} feature columns", x.n_rows(), x.n_columns());
    println!(
        "Encoding categorical columns: {:?}",
        x.low_cardinality_categorical(config.max_categories)
    );

    let split = TrainTestSplit::from_config(config.split.clone()).split(&x, &y)?;
    let mut pipeline = build_pipeline(&config, &x)?;
    pipeline.fit(&split.x_train, &split.y_train)?;
    let predictions = pipeline.predict(&split.x_test)?;
    println!(
        "Validation MAE: {:.0}",
        mean_absolute_error(&predictions, &split.y_test)
    );

    let scores = CrossValidator::new(KFold::from_config(config.cross_validation.clone()))
        .with_parallel(true)
        .evaluate(|| build_pipeline(&config, &x), &x, &y, mean_absolute_error)?;
    if let Some(summary) = ScoreSummary::from_scores(&scores) {
        println!("Cross-validated MAE: {summary}");
    }
    Ok(())
}
