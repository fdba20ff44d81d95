use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

const FIRST_YEAR: i32 = 1961;
const LAST_YEAR: i32 = 2022;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

struct Row {
    meta: [String; 10],
    values: Vec<Option<f64>>,
}

fn main() {
    let mut rng = SimpleRng::new(42);

    // (Country, ISO2, ISO3, warming trend in °C per decade)
    let countries = [
        ("Afghanistan, Islamic Rep. of", "AF", "AFG", 0.22),
        ("Albania", "AL", "ALB", 0.25),
        ("Algeria", "DZ", "DZA", 0.28),
        ("Brazil", "BR", "BRA", 0.18),
        ("Canada", "CA", "CAN", 0.33),
        ("Iceland", "IS", "ISL", 0.30),
        ("Kiribati", "KI", "KIR", 0.12),
    ];
    let indicators = [
        (
            "Temperature change with respect to a baseline climatology, \
             corresponding to the period 1951-1980",
            "TEMP",
        ),
        ("Standard deviation of temperature change", "STD"),
    ];
    let years: Vec<i32> = (FIRST_YEAR..=LAST_YEAR).collect();

    let mut rows = Vec::new();
    let mut object_id = 1;
    for &(country, iso2, iso3, trend) in &countries {
        for &(indicator, code) in &indicators {
            let values = years
                .iter()
                .map(|&year| {
                    // about 3% of cells are missing, as in the published tables
                    if rng.next_f64() < 0.03 {
                        return None;
                    }
                    let decades = f64::from(year - FIRST_YEAR) / 10.0;
                    let v = match code {
                        "TEMP" => rng.gauss(trend * decades - 0.1, 0.35),
                        _ => rng.gauss(0.3, 0.05).abs(),
                    };
                    Some((v * 1000.0).round() / 1000.0)
                })
                .collect();

            rows.push(Row {
                meta: [
                    object_id.to_string(),
                    country.to_string(),
                    iso2.to_string(),
                    iso3.to_string(),
                    indicator.to_string(),
                    "Degree Celsius".to_string(),
                    "Food and Agriculture Organization of the United Nations (FAO)".to_string(),
                    format!("ECCS_{code}"),
                    "Surface Temperature Change".to_string(),
                    "Environment, Climate Change, Climate Indicators, Surface Temperature Change"
                        .to_string(),
                ],
                values,
            });
            object_id += 1;
        }
    }

    let meta_names = [
        "ObjectId",
        "Country",
        "ISO2",
        "ISO3",
        "Indicator",
        "Unit",
        "Source",
        "CTS_Code",
        "CTS_Name",
        "CTS_Full_Descriptor",
    ];
    let year_labels: Vec<String> = years.iter().map(|y| format!("F{y}")).collect();

    // ---- CSV (missing cells written as empty) ----
    let csv_path = "sample_climate.csv";
    let mut writer = csv::Writer::from_path(csv_path).expect("Failed to create CSV file");
    let header: Vec<&str> = meta_names
        .iter()
        .copied()
        .chain(year_labels.iter().map(String::as_str))
        .collect();
    writer.write_record(&header).expect("Failed to write CSV header");
    for row in &rows {
        let cells: Vec<String> = row
            .meta
            .iter()
            .cloned()
            .chain(row.values.iter().map(|v| v.map(|v| v.to_string()).unwrap_or_default()))
            .collect();
        writer.write_record(&cells).expect("Failed to write CSV row");
    }
    writer.flush().expect("Failed to flush CSV file");

    // ---- Parquet ----
    let mut fields = Vec::new();
    let mut columns: Vec<ArrayRef> = Vec::new();
    for (i, name) in meta_names.iter().enumerate() {
        if *name == "ObjectId" {
            fields.push(Field::new(*name, DataType::Int64, false));
            let ids: Vec<i64> = (1..=rows.len() as i64).collect();
            columns.push(Arc::new(Int64Array::from(ids)));
        } else {
            fields.push(Field::new(*name, DataType::Utf8, true));
            let values: Vec<&str> = rows.iter().map(|r| r.meta[i].as_str()).collect();
            columns.push(Arc::new(StringArray::from(values)));
        }
    }
    for (j, label) in year_labels.iter().enumerate() {
        fields.push(Field::new(label, DataType::Float64, true));
        let values: Vec<Option<f64>> = rows.iter().map(|r| r.values[j]).collect();
        columns.push(Arc::new(Float64Array::from(values)));
    }

    let schema = Arc::new(Schema::new(fields));
    let batch =
        RecordBatch::try_new(schema.clone(), columns).expect("Failed to create RecordBatch");

    let parquet_path = "sample_climate.parquet";
    let file = std::fs::File::create(parquet_path).expect("Failed to create output file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("Failed to create writer");
    writer.write(&batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");

    println!(
        "Wrote {} records ({} year columns each) to {csv_path} and {parquet_path}",
        rows.len(),
        year_labels.len()
    );
}
