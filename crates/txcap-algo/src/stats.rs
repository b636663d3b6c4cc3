//! Summary statistics of `Tx_Capacity_MW` over an edge table.

use serde::Serialize;
use txcap_core::CountyEdge;

pub const PERCENTILES: [u8; 7] = [10, 25, 50, 75, 90, 95, 99];

/// Capacity classes as (label, lower bound inclusive, upper bound exclusive).
pub const CAPACITY_BINS: [(&str, f64, f64); 6] = [
    ("<200", 0.0, 200.0),
    ("200-500", 200.0, 500.0),
    ("500-1K", 500.0, 1000.0),
    ("1K-2K", 1000.0, 2000.0),
    ("2K-5K", 2000.0, 5000.0),
    ("5K+", 5000.0, f64::INFINITY),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Percentile {
    pub percentile: u8,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinCount {
    pub label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapacityStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub percentiles: Vec<Percentile>,
    pub distribution: Vec<BinCount>,
}

/// Statistics over the finite capacities; `None` when there are none.
pub fn capacity_stats(edges: &[CountyEdge]) -> Option<CapacityStats> {
    let mut values: Vec<f64> = edges
        .iter()
        .map(|edge| edge.capacity.value())
        .filter(|v| v.is_finite())
        .collect();
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);

    let count = values.len();
    let mean = values.iter().sum::<f64>() / count as f64;
    let percentiles = PERCENTILES
        .iter()
        .map(|&p| Percentile {
            percentile: p,
            value: percentile(&values, f64::from(p)),
        })
        .collect();
    let distribution = CAPACITY_BINS
        .iter()
        .map(|&(label, low, high)| BinCount {
            label,
            count: values.iter().filter(|&&v| v >= low && v < high).count(),
        })
        .collect();

    Some(CapacityStats {
        count,
        min: values[0],
        max: values[count - 1],
        mean,
        median: percentile(&values, 50.0),
        percentiles,
        distribution,
    })
}

/// Linear interpolation between closest ranks over sorted, non-empty values.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

impl std::fmt::Display for CapacityStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Capacity statistics ({} edges):", self.count)?;
        writeln!(f, "  Min: {:.0} MW", self.min)?;
        writeln!(f, "  Max: {:.0} MW", self.max)?;
        writeln!(f, "  Mean: {:.0} MW", self.mean)?;
        writeln!(f, "  Median: {:.0} MW", self.median)?;
        writeln!(f, "Percentiles:")?;
        for p in &self.percentiles {
            writeln!(f, "  {}th: {:.0} MW", p.percentile, p.value)?;
        }
        writeln!(f, "Capacity distribution:")?;
        for bin in &self.distribution {
            writeln!(f, "  {:<8} {}", bin.label, bin.count)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use txcap_core::{CountyFips, EdgeEndpoint, EdgeMetrics, HvdcMetrics, Megawatts};

    fn edges(capacities: &[f64]) -> Vec<CountyEdge> {
        capacities
            .iter()
            .map(|&mw| CountyEdge {
                from: EdgeEndpoint::bare(CountyFips::new("01001")),
                to: EdgeEndpoint::bare(CountyFips::new("01003")),
                capacity: Megawatts(mw),
                metrics: EdgeMetrics::Hvdc(HvdcMetrics { n_links: 1 }),
            })
            .collect()
    }

    #[test]
    fn empty_table_has_no_stats() {
        assert!(capacity_stats(&[]).is_none());
    }

    #[test]
    fn summary_and_interpolated_percentiles() {
        let stats = capacity_stats(&edges(&[100.0, 400.0, 200.0, 300.0])).unwrap();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.min, 100.0);
        assert_eq!(stats.max, 400.0);
        assert_eq!(stats.mean, 250.0);
        assert_eq!(stats.median, 250.0);
        // rank 0.3 between 100 and 200
        assert!((stats.percentiles[0].value - 130.0).abs() < 1e-9);
        assert_eq!(stats.percentiles[0].percentile, 10);
    }

    #[test]
    fn bins_are_left_closed() {
        let capacities = [0.0, 199.9, 200.0, 500.0, 999.0, 5000.0, 12000.0];
        let stats = capacity_stats(&edges(&capacities)).unwrap();
        let counts: Vec<usize> = stats.distribution.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![2, 1, 2, 0, 0, 2]);
    }
}
