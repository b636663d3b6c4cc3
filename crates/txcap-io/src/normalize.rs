//! Raw frames -> typed grid records.
//!
//! Every logical field has an explicit, ordered alias list. The first alias
//! present in a table wins; aliases are resolved here, once, so the
//! aggregation stages never inspect column names.
//!
//! Cell values are read leniently: integer-valued floats become integer text
//! for identifiers (`1.0` and `1` are the same bus), blank strings and NaN are
//! null, and numeric text in string columns is parsed.

use polars::prelude::{DataFrame, DataType, NamedFrom, Series};
use tracing::{debug, info, warn};
use txcap_core::{
    Branch, BranchTable, Bus, BusId, BusSubstation, BusTable, DcLink, DcLinkTable, GridTables,
    Kilovolts, MegavoltAmperes, Megawatts, ReactancePu, Substation, SubstationId, TxcapError,
    TxcapResult, Zone, ZoneId,
};

use crate::format::table_error;
use crate::tables::RawGridTables;

pub mod aliases {
    pub const BUS_ID: &[&str] = &["bus_id", "bus", "bus_i", "bus_idx"];
    pub const BASE_KV: &[&str] = &["base_kv", "basekv", "kv"];
    pub const ZONE_ID: &[&str] = &["zone_id", "zone"];

    pub const SUB_ID: &[&str] = &["sub_id", "sub", "subid"];
    pub const LATITUDE: &[&str] = &["lat", "latitude"];
    pub const LONGITUDE: &[&str] = &["lon", "lng", "longitude"];

    pub const ZONE_NAME: &[&str] = &["zone_name"];
    pub const INTERCONNECT: &[&str] = &["interconnect"];

    pub const BRANCH_FROM: &[&str] = &["fbus", "from_bus_id", "from_bus"];
    pub const BRANCH_TO: &[&str] = &["tbus", "to_bus_id", "to_bus"];
    pub const REACTANCE: &[&str] = &["x", "x_pu", "br_x"];
    pub const RATE_A: &[&str] = &["ratea", "rate_a"];
    pub const RATE_B: &[&str] = &["rateb", "rate_b"];
    pub const RATE_C: &[&str] = &["ratec", "rate_c"];
    pub const BRANCH_STATUS: &[&str] = &["br_status", "status"];
    pub const TAP_RATIO: &[&str] = &["ratio", "tap"];

    pub const DC_FROM: &[&str] = &["f_bus", "from_bus_id", "from_bus", "fbus"];
    pub const DC_TO: &[&str] = &["t_bus", "to_bus_id", "to_bus", "tbus"];
    pub const PMAX: &[&str] = &["pmax", "p_max"];
    pub const DC_STATUS: &[&str] = &["status"];
}

/// Normalize every loaded frame.
///
/// A dcline table without its from/to/pmax fields does not fail the load;
/// it is returned as absent with the missing fields listed.
pub fn grid_tables(raw: &RawGridTables) -> TxcapResult<GridTables> {
    let (dc_links, dcline_missing) = match raw.dcline.as_ref().map(dc_links).transpose() {
        Ok(table) => (table, Vec::new()),
        Err(TxcapError::MissingColumns { columns, .. }) => {
            debug!(missing = ?columns, "dcline table lacks required fields");
            (None, columns)
        }
        Err(err) => return Err(err),
    };
    Ok(GridTables {
        buses: buses(&raw.bus)?,
        branches: branches(&raw.branch)?,
        substations: substations(&raw.sub)?,
        bus_substations: bus_substations(&raw.bus2sub)?,
        zones: raw.zone.as_ref().map(zones).transpose()?,
        dc_links,
        dcline_missing,
    })
}

pub fn buses(df: &DataFrame) -> TxcapResult<BusTable> {
    let [id] = require(df, "bus", [aliases::BUS_ID])?;
    let ids = string_cells(id)?;
    let kv = optional_floats(df, "bus", aliases::BASE_KV)?;
    let zone = optional_strings(df, "bus", aliases::ZONE_ID)?;

    let mut rows = Vec::with_capacity(ids.len());
    let mut skipped = 0usize;
    for (idx, id) in ids.into_iter().enumerate() {
        let Some(id) = id else {
            skipped += 1;
            continue;
        };
        rows.push(Bus {
            id: BusId::new(id),
            base_kv: cell(&kv, idx).map(Kilovolts),
            zone: string_cell(&zone, idx).map(ZoneId::new),
        });
    }
    if skipped > 0 {
        warn!(skipped, "bus rows without an identifier were skipped");
    }
    Ok(BusTable {
        rows,
        has_base_kv: kv.is_some(),
    })
}

pub fn substations(df: &DataFrame) -> TxcapResult<Vec<Substation>> {
    let [id] = require(df, "sub", [aliases::SUB_ID])?;
    let lat = resolve(df, "sub", aliases::LATITUDE);
    let lon = resolve(df, "sub", aliases::LONGITUDE);
    let (lat, lon) = match (lat, lon) {
        (Some(lat), Some(lon)) => (float_cells(lat)?, float_cells(lon)?),
        (lat, lon) => {
            let mut missing = Vec::new();
            if lat.is_none() {
                missing.push("lat");
            }
            if lon.is_none() {
                missing.push("lon");
            }
            return Err(TxcapError::MissingCoordinates(format!(
                "sub table has no {} column",
                missing.join("/")
            )));
        }
    };
    let ids = string_cells(id)?;
    let zone = optional_strings(df, "sub", aliases::ZONE_ID)?;

    Ok(ids
        .into_iter()
        .enumerate()
        .filter_map(|(idx, id)| {
            id.map(|id| Substation {
                id: SubstationId::new(id),
                lat: lat[idx],
                lon: lon[idx],
                zone: string_cell(&zone, idx).map(ZoneId::new),
            })
        })
        .collect())
}

/// Row order is preserved; it decides which substation a multi-listed bus keeps.
pub fn bus_substations(df: &DataFrame) -> TxcapResult<Vec<BusSubstation>> {
    let [bus, sub] = require(df, "bus2sub", [aliases::BUS_ID, aliases::SUB_ID])?;
    let buses = string_cells(bus)?;
    let subs = string_cells(sub)?;
    Ok(buses
        .into_iter()
        .zip(subs)
        .filter_map(|(bus, sub)| match (bus, sub) {
            (Some(bus), Some(sub)) => Some(BusSubstation {
                bus: BusId::new(bus),
                substation: SubstationId::new(sub),
            }),
            _ => None,
        })
        .collect())
}

/// A zone table without a key column carries no usable lookups and yields no rows.
pub fn zones(df: &DataFrame) -> TxcapResult<Vec<Zone>> {
    let Some(id) = resolve(df, "zone", aliases::ZONE_ID) else {
        warn!("zone table has no zone_id column; zone names and interconnects stay null");
        return Ok(Vec::new());
    };
    let ids = string_cells(id)?;
    let names = optional_strings(df, "zone", aliases::ZONE_NAME)?;
    let interconnects = optional_strings(df, "zone", aliases::INTERCONNECT)?;
    Ok(ids
        .into_iter()
        .enumerate()
        .filter_map(|(idx, id)| {
            id.map(|id| Zone {
                id: ZoneId::new(id),
                name: string_cell(&names, idx),
                interconnect: string_cell(&interconnects, idx),
            })
        })
        .collect())
}

pub fn branches(df: &DataFrame) -> TxcapResult<BranchTable> {
    let [from, to, x] = require(
        df,
        "branch",
        [aliases::BRANCH_FROM, aliases::BRANCH_TO, aliases::REACTANCE],
    )?;
    let from = string_cells(from)?;
    let to = string_cells(to)?;
    let x = float_cells(x)?;
    let rate_a = optional_floats(df, "branch", aliases::RATE_A)?;
    let rate_b = optional_floats(df, "branch", aliases::RATE_B)?;
    let rate_c = optional_floats(df, "branch", aliases::RATE_C)?;
    let status = optional_floats(df, "branch", aliases::BRANCH_STATUS)?;
    let ratio = optional_floats(df, "branch", aliases::TAP_RATIO)?;

    let rows = (0..df.height())
        .map(|idx| Branch {
            from_bus: from[idx].clone().map(BusId::new),
            to_bus: to[idx].clone().map(BusId::new),
            x: x[idx].map(ReactancePu),
            rate_a: cell(&rate_a, idx).map(MegavoltAmperes),
            rate_b: cell(&rate_b, idx).map(MegavoltAmperes),
            rate_c: cell(&rate_c, idx).map(MegavoltAmperes),
            status: cell(&status, idx),
            ratio: cell(&ratio, idx),
        })
        .collect();
    Ok(BranchTable {
        rows,
        has_status: status.is_some(),
        has_ratio: ratio.is_some(),
    })
}

pub fn dc_links(df: &DataFrame) -> TxcapResult<DcLinkTable> {
    let [from, to, pmax] = require(
        df,
        "dcline",
        [aliases::DC_FROM, aliases::DC_TO, aliases::PMAX],
    )?;
    let from = string_cells(from)?;
    let to = string_cells(to)?;
    let pmax = float_cells(pmax)?;
    let status = optional_floats(df, "dcline", aliases::DC_STATUS)?;

    let rows = (0..df.height())
        .map(|idx| DcLink {
            from_bus: from[idx].clone().map(BusId::new),
            to_bus: to[idx].clone().map(BusId::new),
            pmax: pmax[idx].map(Megawatts),
            status: cell(&status, idx),
        })
        .collect();
    Ok(DcLinkTable {
        rows,
        has_status: status.is_some(),
    })
}

/// First alias present in the frame.
pub fn resolve<'a>(df: &'a DataFrame, table: &str, aliases: &[&str]) -> Option<&'a Series> {
    let mut present = aliases
        .iter()
        .copied()
        .filter(|alias| df.column(alias).is_ok());
    let chosen = present.next()?;
    let shadowed: Vec<&str> = present.collect();
    if !shadowed.is_empty() {
        info!(
            table,
            column = chosen,
            ignored = ?shadowed,
            "several aliases present; using the first"
        );
    }
    df.column(chosen).ok()
}

/// Resolve every required field or fail naming all of the missing ones.
fn require<'a, const N: usize>(
    df: &'a DataFrame,
    table: &str,
    fields: [&[&str]; N],
) -> TxcapResult<[&'a Series; N]> {
    let resolved = fields.map(|aliases| resolve(df, table, aliases));
    let missing: Vec<String> = fields
        .iter()
        .zip(resolved.iter())
        .filter(|(_, series)| series.is_none())
        .map(|(aliases, _)| aliases.join("/"))
        .collect();
    if !missing.is_empty() {
        return Err(TxcapError::MissingColumns {
            table: table.to_string(),
            columns: missing,
        });
    }
    let mut out = Vec::with_capacity(N);
    for series in resolved.into_iter().flatten() {
        out.push(series);
    }
    out.try_into().map_err(|_| TxcapError::Other(format!("{table}: column resolution mismatch")))
}

fn optional_strings(
    df: &DataFrame,
    table: &str,
    aliases: &[&str],
) -> TxcapResult<Option<Vec<Option<String>>>> {
    resolve(df, table, aliases).map(string_cells).transpose()
}

fn optional_floats(
    df: &DataFrame,
    table: &str,
    aliases: &[&str],
) -> TxcapResult<Option<Vec<Option<f64>>>> {
    resolve(df, table, aliases).map(float_cells).transpose()
}

fn cell(values: &Option<Vec<Option<f64>>>, idx: usize) -> Option<f64> {
    values.as_ref().and_then(|v| v[idx])
}

fn string_cell(values: &Option<Vec<Option<String>>>, idx: usize) -> Option<String> {
    values.as_ref().and_then(|v| v[idx].clone())
}

/// Cells as trimmed text. Integer-valued floats render without a fraction.
pub fn string_cells(series: &Series) -> TxcapResult<Vec<Option<String>>> {
    let name = series.name().to_string();
    match series.dtype() {
        DataType::Utf8 => Ok(series
            .utf8()
            .map_err(|err| table_error(&name, err))?
            .into_iter()
            .map(|value| {
                value
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(str::to_string)
            })
            .collect()),
        DataType::Float32 | DataType::Float64 => Ok(float_cells(series)?
            .into_iter()
            .map(|value| value.map(number_text))
            .collect()),
        DataType::Boolean => {
            let cast = series
                .cast(&DataType::Utf8)
                .map_err(|err| table_error(&name, err))?;
            string_cells(&cast)
        }
        _ => {
            let cast = series
                .cast(&DataType::Int64)
                .map_err(|err| table_error(&name, err))?;
            Ok(cast
                .i64()
                .map_err(|err| table_error(&name, err))?
                .into_iter()
                .map(|value| value.map(|v| v.to_string()))
                .collect())
        }
    }
}

/// Cells as floats. NaN and unparsable text are null.
pub fn float_cells(series: &Series) -> TxcapResult<Vec<Option<f64>>> {
    let name = series.name().to_string();
    if series.dtype() == &DataType::Utf8 {
        let mut unparsable = 0usize;
        let values: Vec<Option<f64>> = series
            .utf8()
            .map_err(|err| table_error(&name, err))?
            .into_iter()
            .map(|value| {
                let text = value.map(str::trim).filter(|v| !v.is_empty())?;
                match text.parse::<f64>() {
                    Ok(v) if !v.is_nan() => Some(v),
                    Ok(_) => None,
                    Err(_) => {
                        unparsable += 1;
                        None
                    }
                }
            })
            .collect();
        if unparsable > 0 {
            debug!(column = %name, unparsable, "non-numeric cells read as null");
        }
        return Ok(values);
    }
    let cast = series
        .cast(&DataType::Float64)
        .map_err(|err| table_error(&name, err))?;
    Ok(cast
        .f64()
        .map_err(|err| table_error(&name, err))?
        .into_iter()
        .map(|value| value.filter(|v| !v.is_nan()))
        .collect())
}

fn number_text(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(columns: Vec<Series>) -> DataFrame {
        DataFrame::new(columns).unwrap()
    }

    #[test]
    fn integer_valued_ids_normalize_to_integer_text() {
        let df = frame(vec![
            Series::new("bus_id", &[1.0, 2.0, 3.5]),
            Series::new("basekv", &[Some(230.0), None, Some(500.0)]),
        ]);
        let table = buses(&df).unwrap();
        let ids: Vec<&str> = table.rows.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3.5"]);
        assert!(table.has_base_kv);
        assert_eq!(table.rows[1].base_kv, None);
        assert_eq!(table.rows[2].base_kv, Some(Kilovolts(500.0)));
    }

    #[test]
    fn string_ids_are_trimmed() {
        let df = frame(vec![Series::new("bus", &[" 10 ", "", "11"])]);
        let table = buses(&df).unwrap();
        let ids: Vec<&str> = table.rows.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["10", "11"]);
        assert!(!table.has_base_kv);
    }

    #[test]
    fn branch_aliases_resolve_in_order() {
        let df = frame(vec![
            Series::new("from_bus_id", &[1i64]),
            Series::new("to_bus_id", &[2i64]),
            Series::new("x", &[0.1]),
            Series::new("rate_a", &[300.0]),
            Series::new("status", &[1i64]),
        ]);
        let table = branches(&df).unwrap();
        let branch = &table.rows[0];
        assert_eq!(branch.from_bus.as_ref().unwrap().as_str(), "1");
        assert_eq!(branch.to_bus.as_ref().unwrap().as_str(), "2");
        assert_eq!(branch.rate_a, Some(MegavoltAmperes(300.0)));
        assert!(table.has_status);
        assert!(!table.has_ratio);
        assert!(branch.is_in_service());
    }

    #[test]
    fn br_status_takes_precedence_over_status() {
        let df = frame(vec![
            Series::new("fbus", &[1i64]),
            Series::new("tbus", &[2i64]),
            Series::new("x", &[0.1]),
            Series::new("status", &[1i64]),
            Series::new("br_status", &[0i64]),
        ]);
        let table = branches(&df).unwrap();
        assert!(!table.rows[0].is_in_service());
    }

    #[test]
    fn missing_branch_columns_are_named() {
        let df = frame(vec![Series::new("fbus", &[1i64]), Series::new("r", &[0.01])]);
        let err = branches(&df).unwrap_err();
        match err {
            TxcapError::MissingColumns { table, columns } => {
                assert_eq!(table, "branch");
                assert_eq!(columns, vec!["tbus/to_bus_id/to_bus", "x/x_pu/br_x"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn substations_require_coordinates() {
        let df = frame(vec![
            Series::new("sub_id", &[1i64]),
            Series::new("lat", &[39.7]),
        ]);
        let err = substations(&df).unwrap_err();
        assert!(matches!(err, TxcapError::MissingCoordinates(msg) if msg.contains("lon")));
    }

    #[test]
    fn dcline_requires_pmax() {
        let df = frame(vec![
            Series::new("from_bus_id", &[1i64]),
            Series::new("to_bus_id", &[3i64]),
        ]);
        let err = dc_links(&df).unwrap_err();
        assert!(matches!(err, TxcapError::MissingColumns { ref table, .. } if table == "dcline"));
    }

    #[test]
    fn numeric_text_and_nan_cells() {
        let series = Series::new("pmax", &[Some("500"), Some(" 12.5 "), Some("n/a"), None]);
        assert_eq!(
            float_cells(&series).unwrap(),
            vec![Some(500.0), Some(12.5), None, None]
        );
        let floats = Series::new("x", &[Some(f64::NAN), Some(0.2)]);
        assert_eq!(float_cells(&floats).unwrap(), vec![None, Some(0.2)]);
    }

    #[test]
    fn zone_table_without_key_yields_nothing() {
        let df = frame(vec![Series::new("zone_name", &["Colorado"])]);
        assert!(zones(&df).unwrap().is_empty());
    }
}
