//! Edge table and bus map serialization.

use std::path::Path;

use polars::prelude::{DataFrame, NamedFrom, Series};
use tracing::info;
use txcap_core::{
    AcMetrics, CountyEdge, CountyFips, EdgeColumn, EdgeEndpoint, EdgeMetrics, EdgeType,
    EnrichedBus, HvdcMetrics, Kilovolts, MegavoltAmperes, Megawatts, ReactancePu, SusceptancePu,
    TxcapError, TxcapResult, ZoneId,
};

use crate::format::{read_table, table_error, write_table};
use crate::normalize::{float_cells, string_cells};

enum ColumnValues {
    Text(Vec<Option<String>>),
    Float(Vec<Option<f64>>),
    Count(Vec<Option<i64>>),
}

fn column_values(column: EdgeColumn, edges: &[CountyEdge]) -> ColumnValues {
    let text = |f: &dyn Fn(&CountyEdge) -> Option<String>| {
        ColumnValues::Text(edges.iter().map(f).collect())
    };
    let float = |f: &dyn Fn(&CountyEdge) -> Option<f64>| {
        ColumnValues::Float(edges.iter().map(f).collect())
    };
    let ac = |f: &dyn Fn(&AcMetrics) -> Option<f64>| {
        ColumnValues::Float(edges.iter().map(|e| e.ac().and_then(f)).collect())
    };
    match column {
        EdgeColumn::EdgeType => text(&|e| Some(e.edge_type().to_string())),
        EdgeColumn::FromState => text(&|e| e.from.state.clone()),
        EdgeColumn::FromFips => text(&|e| Some(e.from.fips.to_string())),
        EdgeColumn::FromCounty => text(&|e| e.from.county.clone()),
        EdgeColumn::FromZone => text(&|e| e.from.zone.as_ref().map(ZoneId::to_string)),
        EdgeColumn::FromZoneName => text(&|e| e.from.zone_name.clone()),
        EdgeColumn::FromInterconnect => text(&|e| e.from.interconnect.clone()),
        EdgeColumn::ToState => text(&|e| e.to.state.clone()),
        EdgeColumn::ToFips => text(&|e| Some(e.to.fips.to_string())),
        EdgeColumn::ToCounty => text(&|e| e.to.county.clone()),
        EdgeColumn::ToZone => text(&|e| e.to.zone.as_ref().map(ZoneId::to_string)),
        EdgeColumn::ToZoneName => text(&|e| e.to.zone_name.clone()),
        EdgeColumn::ToInterconnect => text(&|e| e.to.interconnect.clone()),
        EdgeColumn::TxCapacityMw => float(&|e| Some(e.capacity.value())),
        EdgeColumn::NCircuits => ColumnValues::Count(
            edges
                .iter()
                .map(|e| e.ac().map(|m| m.n_circuits as i64))
                .collect(),
        ),
        EdgeColumn::NLinks => ColumnValues::Count(
            edges
                .iter()
                .map(|e| e.hvdc().map(|m| m.n_links as i64))
                .collect(),
        ),
        EdgeColumn::SumRateMva => ac(&|m| Some(m.sum_rate_mva.value())),
        EdgeColumn::SumBPu => ac(&|m| Some(m.sum_b_pu.value())),
        EdgeColumn::XEqPu => ac(&|m| m.x_eq_pu.map(|x| x.value())),
        EdgeColumn::PfUsedMed => ac(&|m| m.pf_used_med),
        EdgeColumn::KvMinMed => ac(&|m| m.kv_min_med.map(|kv| kv.value())),
    }
}

/// Columns emitted for a set of edges: canonical order, minus columns
/// specific to an edge type that does not occur.
pub fn edge_columns(edges: &[CountyEdge]) -> Vec<EdgeColumn> {
    let has_ac = edges.iter().any(|e| e.edge_type() == EdgeType::Ac);
    let has_hvdc = edges.iter().any(|e| e.edge_type() == EdgeType::Hvdc);
    EdgeColumn::ALL
        .iter()
        .copied()
        .filter(|column| match column.specific_to() {
            Some(EdgeType::Ac) => has_ac,
            Some(EdgeType::Hvdc) => has_hvdc,
            None => true,
        })
        .collect()
}

pub fn edges_to_dataframe(edges: &[CountyEdge]) -> TxcapResult<DataFrame> {
    let columns: Vec<Series> = edge_columns(edges)
        .into_iter()
        .map(|column| match column_values(column, edges) {
            ColumnValues::Text(values) => Series::new(column.name(), values),
            ColumnValues::Float(values) => Series::new(column.name(), values),
            ColumnValues::Count(values) => Series::new(column.name(), values),
        })
        .collect();
    DataFrame::new(columns).map_err(|err| table_error("edge table", err))
}

/// Write the edge table; CSV unless the path ends in `.parquet` or an Arrow IPC extension.
pub fn write_edges(edges: &[CountyEdge], path: &Path) -> TxcapResult<()> {
    let mut df = edges_to_dataframe(edges)?;
    write_table(&mut df, path)?;
    info!(rows = df.height(), path = %path.display(), "edge table written");
    Ok(())
}

/// Read an edge table produced by [`write_edges`].
pub fn read_edges(path: &Path) -> TxcapResult<Vec<CountyEdge>> {
    let df = read_table(path)?;
    let text = |name: &str| -> TxcapResult<Option<Vec<Option<String>>>> {
        match df.column(&name.to_lowercase()) {
            Ok(series) => string_cells(series).map(Some),
            Err(_) => Ok(None),
        }
    };
    let float = |name: &str| -> TxcapResult<Option<Vec<Option<f64>>>> {
        match df.column(&name.to_lowercase()) {
            Ok(series) => float_cells(series).map(Some),
            Err(_) => Ok(None),
        }
    };

    let required = [
        EdgeColumn::EdgeType,
        EdgeColumn::FromFips,
        EdgeColumn::ToFips,
        EdgeColumn::TxCapacityMw,
    ];
    let missing: Vec<String> = required
        .iter()
        .filter(|c| df.column(&c.name().to_lowercase()).is_err())
        .map(|c| c.name().to_string())
        .collect();
    if !missing.is_empty() {
        return Err(TxcapError::MissingColumns {
            table: path.display().to_string(),
            columns: missing,
        });
    }

    let edge_type = text(EdgeColumn::EdgeType.name())?.unwrap_or_default();
    let capacity = float(EdgeColumn::TxCapacityMw.name())?.unwrap_or_default();
    let from = endpoint_columns(&text, "From")?;
    let to = endpoint_columns(&text, "To")?;
    let n_circuits = float(EdgeColumn::NCircuits.name())?;
    let n_links = float(EdgeColumn::NLinks.name())?;
    let sum_rate = float(EdgeColumn::SumRateMva.name())?;
    let sum_b = float(EdgeColumn::SumBPu.name())?;
    let x_eq = float(EdgeColumn::XEqPu.name())?;
    let pf = float(EdgeColumn::PfUsedMed.name())?;
    let kv = float(EdgeColumn::KvMinMed.name())?;

    let at = |values: &Option<Vec<Option<f64>>>, idx: usize| values.as_ref().and_then(|v| v[idx]);

    let mut edges = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let kind: EdgeType = edge_type[idx]
            .as_deref()
            .ok_or_else(|| TxcapError::Parse(format!("row {idx}: empty edge_type")))?
            .parse()?;
        let metrics = match kind {
            EdgeType::Ac => EdgeMetrics::Ac(AcMetrics {
                n_circuits: at(&n_circuits, idx).unwrap_or(0.0) as usize,
                sum_rate_mva: MegavoltAmperes(at(&sum_rate, idx).unwrap_or(0.0)),
                sum_b_pu: SusceptancePu(at(&sum_b, idx).unwrap_or(0.0)),
                x_eq_pu: at(&x_eq, idx).map(ReactancePu),
                pf_used_med: at(&pf, idx),
                kv_min_med: at(&kv, idx).map(Kilovolts),
            }),
            EdgeType::Hvdc => EdgeMetrics::Hvdc(HvdcMetrics {
                n_links: at(&n_links, idx).unwrap_or(0.0) as usize,
            }),
        };
        edges.push(CountyEdge {
            from: from.endpoint(idx)?,
            to: to.endpoint(idx)?,
            capacity: Megawatts(capacity[idx].unwrap_or(0.0)),
            metrics,
        });
    }
    Ok(edges)
}

struct EndpointColumns {
    fips: Vec<Option<String>>,
    state: Option<Vec<Option<String>>>,
    county: Option<Vec<Option<String>>>,
    zone: Option<Vec<Option<String>>>,
    zone_name: Option<Vec<Option<String>>>,
    interconnect: Option<Vec<Option<String>>>,
}

fn endpoint_columns(
    text: &dyn Fn(&str) -> TxcapResult<Option<Vec<Option<String>>>>,
    side: &str,
) -> TxcapResult<EndpointColumns> {
    Ok(EndpointColumns {
        fips: text(&format!("{side}_fips"))?.unwrap_or_default(),
        state: text(&format!("{side}_state"))?,
        county: text(&format!("{side}_County"))?,
        zone: text(&format!("{side}_zone"))?,
        zone_name: text(&format!("{side}_zone_name"))?,
        interconnect: text(&format!("{side}_interconnect"))?,
    })
}

impl EndpointColumns {
    fn endpoint(&self, idx: usize) -> TxcapResult<EdgeEndpoint> {
        let get = |values: &Option<Vec<Option<String>>>| {
            values.as_ref().and_then(|v| v[idx].clone())
        };
        let fips = self.fips[idx]
            .as_deref()
            .and_then(CountyFips::parse)
            .ok_or_else(|| TxcapError::Parse(format!("row {idx}: empty county FIPS")))?;
        Ok(EdgeEndpoint {
            state_fips: fips.state_part().map(str::to_string),
            fips,
            county: get(&self.county),
            state: get(&self.state),
            zone: get(&self.zone).map(ZoneId::new),
            zone_name: get(&self.zone_name),
            interconnect: get(&self.interconnect),
        })
    }
}

/// Bus -> county mapping as a table.
pub fn bus_map_to_dataframe(buses: &[EnrichedBus]) -> TxcapResult<DataFrame> {
    let text = |f: &dyn Fn(&EnrichedBus) -> Option<String>| -> Vec<Option<String>> {
        buses.iter().map(f).collect()
    };
    DataFrame::new(vec![
        Series::new("bus_id", text(&|b| Some(b.id.to_string()))),
        Series::new("sub_id", text(&|b| b.substation.as_ref().map(|s| s.to_string()))),
        Series::new("county_fips", text(&|b| b.county_fips().map(|f| f.to_string()))),
        Series::new(
            "county_name",
            text(&|b| b.county.as_ref().and_then(|c| c.name.clone())),
        ),
        Series::new(
            "state_fips",
            text(&|b| b.county.as_ref().and_then(|c| c.state_fips.clone())),
        ),
        Series::new("zone_id", text(&|b| b.zone.as_ref().map(|z| z.to_string()))),
        Series::new("zone_name", text(&|b| b.zone_name.clone())),
        Series::new("interconnect", text(&|b| b.interconnect.clone())),
    ])
    .map_err(|err| table_error("bus map", err))
}

pub fn write_bus_map(buses: &[EnrichedBus], path: &Path) -> TxcapResult<()> {
    let mut df = bus_map_to_dataframe(buses)?;
    write_table(&mut df, path)?;
    info!(rows = df.height(), path = %path.display(), "bus map written");
    Ok(())
}
