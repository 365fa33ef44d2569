use super::{impact_unit, ReportingAdapter};
use crate::domain::model::{KeyIndicators, RunResult};
use crate::utils::error::{Ml2Error, Result};

/// One row per series, one column per year:
/// `section,variable,unit,<year>...`
pub fn to_csv(adapter: &ReportingAdapter, result: &RunResult) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header = vec!["section".to_string(), "variable".to_string(), "unit".to_string()];
    header.extend(result.years.iter().map(|year| year.to_string()));
    writer.write_record(&header)?;

    // instruments first, as resolved for the scenario
    for key in result.instruments.keys() {
        let variable = adapter.variable(key)?;
        let series = result.levels.get(key).ok_or_else(|| Ml2Error::ReportError {
            message: format!("no levels recorded for instrument {}", key),
        })?;
        write_row(&mut writer, "instrument", key, &variable.unit, series)?;
    }

    write_indicators(&mut writer, "baseline", &result.baseline)?;
    write_indicators(&mut writer, "scenario", &result.scenario)?;

    for (variable, series) in adapter.mapped_series(&result.impacts, &result.years)? {
        write_row(&mut writer, "impact", &variable.key, &impact_unit(variable), series)?;
    }
    for (variable, series) in adapter.mapped_series(&result.levels, &result.years)? {
        write_row(&mut writer, "level", &variable.key, &variable.unit, series)?;
    }

    writer.into_inner().map_err(|e| Ml2Error::ReportError {
        message: format!("Failed to finish CSV export: {}", e),
    })
}

fn write_indicators(
    writer: &mut csv::Writer<Vec<u8>>,
    section: &str,
    indicators: &KeyIndicators,
) -> Result<()> {
    write_row(writer, section, "gdp_growth", "%", &indicators.gdp_growth)?;
    write_row(writer, section, "inflation", "%", &indicators.inflation)?;
    write_row(writer, section, "deficit_ratio", "% of GDP", &indicators.deficit_ratio)?;
    write_row(writer, section, "unemployment", "%", &indicators.unemployment)?;
    Ok(())
}

fn write_row(
    writer: &mut csv::Writer<Vec<u8>>,
    section: &str,
    variable: &str,
    unit: &str,
    values: &[f64],
) -> Result<()> {
    let mut record = vec![section.to_string(), variable.to_string(), unit.to_string()];
    record.extend(values.iter().map(|value| value.to_string()));
    writer.write_record(&record)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SimulationEngine;
    use crate::domain::model::{InstrumentVector, SolverSettings};
    use crate::model::scalars::Ml2Scalars;

    #[test]
    fn test_csv_sections_and_header() {
        let engine =
            SimulationEngine::ml2(&Ml2Scalars::default(), None, SolverSettings::default()).unwrap();
        let result = engine
            .simulate_blocking("csv", &InstrumentVector::from([("VIG_X".to_string(), 500.0)]))
            .unwrap();
        let adapter = ReportingAdapter::new(engine.registry().clone());

        let bytes = to_csv(&adapter, &result).unwrap();
        let mut reader = csv::Reader::from_reader(bytes.as_slice());

        let header = reader.headers().unwrap().clone();
        assert_eq!(&header[0], "section");
        assert_eq!(&header[3], "2013");
        assert_eq!(header.len(), 3 + 8);

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        let vig = rows
            .iter()
            .find(|r| &r[0] == "instrument" && &r[1] == "VIG_X")
            .unwrap();
        assert_eq!(&vig[3], "500");
        assert_eq!(rows.iter().filter(|r| &r[0] == "baseline").count(), 4);
        assert!(rows.iter().any(|r| &r[0] == "impact" && &r[1] == "UR_" && &r[2] == "pp"));
        assert_eq!(
            rows.iter().filter(|r| &r[0] == "level").count(),
            engine.registry().len()
        );
    }
}
