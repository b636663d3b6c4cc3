//! AC circuits -> county-pair edges.
//!
//! Each surviving circuit contributes `rating * pf` MW and `1/x` pu of
//! susceptance to its canonical county pair. A circuit with no usable rating
//! still counts toward `n_circuits` but adds nothing to the sums; likewise a
//! zero or non-finite reactance is left out of `sum_B_pu`.

use tracing::{debug, info, warn};
use txcap_core::{
    AcMetrics, BranchTable, CountyEdge, Diagnostics, EdgeMetrics, Kilovolts,
    MegavoltAmperes, Megawatts, StateLookup, SusceptancePu,
};

use crate::mode::median;
use crate::options::AggregationOptions;
use crate::pairing::{group_endpoints, group_pairs, pair_rows, BusIndex};
use crate::power_factor::{CircuitPowerFactor, PowerFactorRule};
use crate::rating::select_rating;

/// Row counts through the AC stages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AcCounts {
    pub input: usize,
    pub out_of_service: usize,
    pub transformers: usize,
    pub unresolved: usize,
    pub intra_county: usize,
    /// Circuits that reached an edge
    pub aggregated: usize,
    pub unrated: usize,
    pub undefined_reactance: usize,
}

#[derive(Debug, Clone, Default)]
pub struct AcAggregation {
    pub edges: Vec<CountyEdge>,
    pub diagnostics: Diagnostics,
    pub counts: AcCounts,
}

/// Per-circuit values carried through pairing.
#[derive(Debug, Clone, Copy)]
struct Circuit {
    rating: Option<MegavoltAmperes>,
    factor: CircuitPowerFactor,
    susceptance: Option<SusceptancePu>,
}

impl Circuit {
    fn capacity(&self) -> Megawatts {
        self.rating
            .map(|rating| rating.active_power(self.factor.pf))
            .unwrap_or_default()
    }
}

pub fn aggregate_ac(
    branches: &BranchTable,
    buses: &BusIndex<'_>,
    options: &AggregationOptions,
    states: &dyn StateLookup,
) -> AcAggregation {
    let mut counts = AcCounts {
        input: branches.rows.len(),
        ..AcCounts::default()
    };
    let mut diagnostics = Diagnostics::new();

    let rule = PowerFactorRule::new(options.pf, buses.has_base_kv);
    if rule.is_degraded() {
        warn!("bus table has no nominal voltage column; bykv power factor falls back to 1.0");
        diagnostics.add_warning(
            "power_factor",
            "no nominal voltage column; bykv power factor fell back to 1.0",
        );
    }

    let kept = branches.rows.iter().filter(|branch| {
        if branches.has_status && !branch.is_in_service() {
            counts.out_of_service += 1;
            return false;
        }
        if branches.has_ratio && !options.include_transformers && branch.is_transformer() {
            counts.transformers += 1;
            return false;
        }
        true
    });
    let rows: Vec<_> = kept
        .map(|branch| (branch.from_bus.as_ref(), branch.to_bus.as_ref(), branch))
        .collect();
    debug!(
        out_of_service = counts.out_of_service,
        transformers = counts.transformers,
        "branch filters applied"
    );

    let (paired, drops) = pair_rows(rows, buses, options.keep_intra_county);
    counts.unresolved = drops.unresolved;
    counts.intra_county = drops.intra_county;
    counts.aggregated = paired.len();

    let paired: Vec<_> = paired
        .into_iter()
        .map(|row| {
            row.map_payload(|low, high, branch| {
                let rating = select_rating(branch, options.rate);
                let susceptance = branch.x.and_then(|x| x.to_susceptance());
                if rating.is_none() {
                    counts.unrated += 1;
                }
                if susceptance.is_none() {
                    counts.undefined_reactance += 1;
                }
                Circuit {
                    rating,
                    factor: rule.for_circuit(low.base_kv, high.base_kv),
                    susceptance,
                }
            })
        })
        .collect();

    let mut edges = Vec::new();
    for (key, group) in group_pairs(paired) {
        let (from, to) = group_endpoints(&key, &group, states);
        let circuits: Vec<Circuit> = group.iter().map(|row| row.payload).collect();
        let capacity: Megawatts = circuits.iter().map(Circuit::capacity).sum();
        let sum_rate_mva: MegavoltAmperes = circuits.iter().filter_map(|c| c.rating).sum();
        let sum_b_pu: SusceptancePu = circuits.iter().filter_map(|c| c.susceptance).sum();
        let kv_min_med = if options.pf.is_by_voltage() {
            median(circuits.iter().map(|c| c.factor.kv_min.map(Kilovolts::value))).map(Kilovolts)
        } else {
            None
        };
        edges.push(CountyEdge {
            from,
            to,
            capacity,
            metrics: EdgeMetrics::Ac(AcMetrics {
                n_circuits: circuits.len(),
                sum_rate_mva,
                sum_b_pu,
                x_eq_pu: sum_b_pu.to_reactance(),
                pf_used_med: median(circuits.iter().map(|c| Some(c.factor.pf))),
                kv_min_med,
            }),
        });
    }

    if counts.unresolved > 0 {
        warn!(
            dropped = counts.unresolved,
            "branches with an endpoint outside every county dropped"
        );
    }
    diagnostics.add_warning_count(
        "unresolved_branch",
        "branches dropped for an unresolved endpoint",
        counts.unresolved,
    );
    diagnostics.add_warning_count(
        "rating",
        "circuits without a usable rating (zero capacity contribution)",
        counts.unrated,
    );
    diagnostics.add_warning_count(
        "reactance",
        "circuits with zero or undefined reactance (excluded from sum_B_pu)",
        counts.undefined_reactance,
    );
    diagnostics.add_info_count(
        "out_of_service",
        "branches filtered by status",
        counts.out_of_service,
    );
    diagnostics.add_info_count(
        "transformer",
        "transformer branches excluded",
        counts.transformers,
    );
    diagnostics.add_info_count(
        "intra_county",
        "intra-county branches dropped",
        counts.intra_county,
    );
    info!(
        circuits = counts.aggregated,
        edges = edges.len(),
        "AC aggregation complete"
    );

    AcAggregation {
        edges,
        diagnostics,
        counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{PowerFactorMode, RatingPreference};
    use crate::pairing::fixtures::bus;
    use txcap_core::{Branch, BusId, EnrichedBus, ReactancePu, UsStates};

    fn branch(from: &str, to: &str, x: f64, rate_a: f64) -> Branch {
        Branch {
            from_bus: Some(BusId::new(from)),
            to_bus: Some(BusId::new(to)),
            x: Some(ReactancePu(x)),
            rate_a: Some(MegavoltAmperes(rate_a)),
            status: Some(1.0),
            ..Branch::default()
        }
    }

    fn table(rows: Vec<Branch>) -> BranchTable {
        BranchTable {
            rows,
            has_status: true,
            has_ratio: true,
        }
    }

    fn run(buses: &[EnrichedBus], rows: Vec<Branch>, options: AggregationOptions) -> AcAggregation {
        let index = BusIndex::new(buses, true);
        aggregate_ac(&table(rows), &index, &options, &UsStates)
    }

    fn two_counties() -> Vec<EnrichedBus> {
        vec![
            bus("1", Some("08059"), Some(500.0)),
            bus("2", Some("08031"), Some(230.0)),
            bus("3", Some("08031"), Some(115.0)),
        ]
    }

    #[test]
    fn parallel_circuits_sum_into_one_edge() {
        let result = run(
            &two_counties(),
            vec![branch("1", "2", 0.1, 300.0), branch("3", "1", 0.2, 200.0)],
            AggregationOptions::default(),
        );
        assert_eq!(result.edges.len(), 1);
        let edge = &result.edges[0];
        assert_eq!(edge.from.fips.as_str(), "08031");
        assert_eq!(edge.to.fips.as_str(), "08059");
        assert_eq!(edge.capacity, Megawatts(500.0));
        let ac = edge.ac().unwrap();
        assert_eq!(ac.n_circuits, 2);
        assert!((ac.sum_b_pu.value() - 15.0).abs() < 1e-9);
        assert!((ac.x_eq_pu.unwrap().value() - 1.0 / 15.0).abs() < 1e-12);
        assert_eq!(ac.pf_used_med, Some(1.0));
        assert_eq!(ac.kv_min_med, None);
    }

    #[test]
    fn zero_rate_a_falls_back_to_rate_b() {
        let mut circuit = branch("1", "2", 0.1, 0.0);
        circuit.rate_b = Some(MegavoltAmperes(150.0));
        let result = run(&two_counties(), vec![circuit], AggregationOptions::default());
        assert_eq!(result.edges[0].capacity, Megawatts(150.0));
        assert_eq!(result.counts.unrated, 0);
    }

    #[test]
    fn bykv_uses_lower_endpoint_voltage() {
        let options = AggregationOptions {
            pf: PowerFactorMode::ByVoltage,
            ..AggregationOptions::default()
        };
        let result = run(&two_counties(), vec![branch("1", "2", 0.1, 1000.0)], options);
        let edge = &result.edges[0];
        assert!((edge.capacity.value() - 970.0).abs() < 1e-9);
        let ac = edge.ac().unwrap();
        assert_eq!(ac.pf_used_med, Some(0.97));
        assert_eq!(ac.kv_min_med, Some(Kilovolts(230.0)));
    }

    #[test]
    fn bykv_without_voltage_column_degrades() {
        let buses = two_counties();
        let index = BusIndex::new(&buses, false);
        let options = AggregationOptions {
            pf: PowerFactorMode::ByVoltage,
            ..AggregationOptions::default()
        };
        let branches = table(vec![branch("1", "2", 0.1, 1000.0)]);
        let result = aggregate_ac(&branches, &index, &options, &UsStates);
        assert_eq!(result.edges[0].capacity, Megawatts(1000.0));
        assert_eq!(result.diagnostics.issues_by_category("power_factor").count(), 1);
    }

    #[test]
    fn transformers_excluded_unless_requested() {
        let mut transformer = branch("1", "2", 0.05, 400.0);
        transformer.ratio = Some(1.02);
        let result = run(&two_counties(), vec![transformer.clone()], AggregationOptions::default());
        assert!(result.edges.is_empty());
        assert_eq!(result.counts.transformers, 1);

        let options = AggregationOptions {
            include_transformers: true,
            ..AggregationOptions::default()
        };
        let result = run(&two_counties(), vec![transformer], options);
        assert_eq!(result.edges.len(), 1);
    }

    #[test]
    fn status_filter_only_applies_when_column_present() {
        let mut offline = branch("1", "2", 0.1, 300.0);
        offline.status = Some(0.0);
        let result = run(&two_counties(), vec![offline.clone()], AggregationOptions::default());
        assert!(result.edges.is_empty());
        assert_eq!(result.counts.out_of_service, 1);

        let buses = two_counties();
        let index = BusIndex::new(&buses, true);
        let no_status = BranchTable {
            rows: vec![offline],
            has_status: false,
            has_ratio: false,
        };
        let result = aggregate_ac(&no_status, &index, &AggregationOptions::default(), &UsStates);
        assert_eq!(result.edges.len(), 1);
    }

    #[test]
    fn unrated_and_zero_reactance_circuits_still_count() {
        let mut unrated = branch("1", "2", 0.0, 0.0);
        unrated.rate_b = None;
        let result = run(
            &two_counties(),
            vec![unrated, branch("1", "2", 0.1, 300.0)],
            AggregationOptions::default(),
        );
        let ac = result.edges[0].ac().unwrap();
        assert_eq!(ac.n_circuits, 2);
        assert_eq!(result.edges[0].capacity, Megawatts(300.0));
        assert_eq!(result.counts.unrated, 1);
        assert_eq!(result.counts.undefined_reactance, 1);
        assert_eq!(result.diagnostics.count_for("rating"), 1);
    }

    #[test]
    fn intra_county_circuits_become_self_loops_when_kept() {
        let rows = vec![branch("2", "3", 0.1, 100.0)];
        let result = run(&two_counties(), rows.clone(), AggregationOptions::default());
        assert!(result.edges.is_empty());
        assert_eq!(result.counts.intra_county, 1);

        let options = AggregationOptions {
            keep_intra_county: true,
            rate: RatingPreference::A,
            ..AggregationOptions::default()
        };
        let result = run(&two_counties(), rows, options);
        assert!(result.edges[0].is_self_loop());
        assert_eq!(result.edges[0].from, result.edges[0].to);
    }
}
