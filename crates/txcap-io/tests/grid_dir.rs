use std::fs;

use txcap_core::TxcapError;
use txcap_io::load_grid_tables;

fn write_base(dir: &std::path::Path, branch: &str) {
    fs::write(dir.join("BUS.csv"), "Bus_ID,baseKV\n1,345\n2,138\n").unwrap();
    fs::write(dir.join("sub.csv"), "sub_id,lat,lon,zone_id\n10,39.7,-104.9,212\n").unwrap();
    fs::write(dir.join("bus2sub.csv"), "bus_id,sub_id\n1,10\n2,10\n").unwrap();
    fs::write(dir.join("branch.csv"), branch).unwrap();
}

#[test]
fn loads_grid_with_aliases_and_optional_tables_absent() {
    let dir = tempfile::tempdir().unwrap();
    write_base(
        dir.path(),
        "fbus,tbus,br_x,rate_a,br_status\n1,2,0.05,400,1\n2,1,0,0,0\n",
    );
    let grid = load_grid_tables(dir.path()).unwrap();

    assert_eq!(grid.buses.rows.len(), 2);
    assert!(grid.buses.has_base_kv);
    assert_eq!(grid.branches.rows.len(), 2);
    assert!(grid.branches.has_status);
    assert!(!grid.branches.has_ratio);
    let first = &grid.branches.rows[0];
    assert_eq!(first.from_bus.as_ref().unwrap().as_str(), "1");
    assert_eq!(first.x.unwrap().value(), 0.05);
    assert!(grid.zones.is_none());
    assert!(grid.dc_links.is_none());
}

#[test]
fn branch_without_reactance_names_the_missing_field() {
    let dir = tempfile::tempdir().unwrap();
    write_base(dir.path(), "fbus,tbus,rate_a\n1,2,400\n");
    let err = load_grid_tables(dir.path()).unwrap_err();
    match err {
        TxcapError::MissingColumns { table, columns } => {
            assert_eq!(table, "branch");
            assert_eq!(columns, vec!["x/x_pu/br_x".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn dcline_without_pmax_loads_as_absent() {
    let dir = tempfile::tempdir().unwrap();
    write_base(dir.path(), "fbus,tbus,x,rate_a\n1,2,0.05,400\n");
    fs::write(dir.path().join("dcline.csv"), "f_bus,t_bus,status\n1,2,1\n").unwrap();
    let grid = load_grid_tables(dir.path()).unwrap();
    assert!(grid.dc_links.is_none());
    assert_eq!(grid.dcline_missing, vec!["pmax/p_max".to_string()]);
}
