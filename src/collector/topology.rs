//! One-time discovery of the cores listed in the counter file.

use std::io::{self, Read, Seek};

use crate::collector::procfs::parser::core_line_id;
use crate::collector::source::ProcStatSource;

/// Lists the ids of the per-core lines (`cpu0`, `cpu1`, ...) in one pass over `source`.
///
/// Ids are returned in file order and the length is the core count. The
/// aggregate `cpu` line is not counted. The source is rewound afterwards so the
/// next reader starts from the beginning.
pub fn discover_cores<R: Read + Seek>(source: &mut ProcStatSource<R>) -> io::Result<Vec<u32>> {
    let mut ids = Vec::new();
    source.scan(|line| {
        if let Some(id) = core_line_id(line) {
            ids.push(id);
        }
        true
    })?;
    source.rewind()?;

    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::MockProcStat;

    #[test]
    fn test_discover_excludes_aggregate() {
        let mut source = ProcStatSource::new(MockProcStat::new(
            "cpu 1 2 3 4 5 6 7 8 9 10\n\
             cpu0 1 2 3 4 5 6 7 8 9 10\n\
             cpu1 1 2 3 4 5 6 7 8 9 10\n",
        ));
        assert_eq!(discover_cores(&mut source).unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_discover_quad_core() {
        let mut source = ProcStatSource::new(MockProcStat::quad_core_idle());
        assert_eq!(discover_cores(&mut source).unwrap().len(), 4);
    }

    #[test]
    fn test_discover_no_cores() {
        let mut source = ProcStatSource::new(MockProcStat::aggregate_only());
        assert!(discover_cores(&mut source).unwrap().is_empty());
    }

    #[test]
    fn test_discover_keeps_sparse_ids() {
        // cpu1 offline at startup
        let mut source = ProcStatSource::new(MockProcStat::new(
            "cpu  1 2 3 4 5 6 7 8 9 10\n\
             cpu0 1 2 3 4 5 6 7 8 9 10\n\
             cpu2 1 2 3 4 5 6 7 8 9 10\n\
             cpu3 1 2 3 4 5 6 7 8 9 10\n",
        ));
        assert_eq!(discover_cores(&mut source).unwrap(), vec![0, 2, 3]);
    }

    #[test]
    fn test_discover_counts_lines_regardless_of_field_count() {
        // Discovery only looks at the tag; sampling decides whether a line is usable.
        let mut source = ProcStatSource::new(MockProcStat::legacy_eight_fields());
        assert_eq!(discover_cores(&mut source).unwrap().len(), 2);
        assert!(source.sample().is_empty());
    }

    #[test]
    fn test_discover_then_sample_starts_at_beginning() {
        let mut source = ProcStatSource::new(MockProcStat::dual_core());
        let ids = discover_cores(&mut source).unwrap();

        let mut out = vec![None; ids.len()];
        assert_eq!(source.sample_into(&ids, &mut out), 2);
    }

    #[test]
    fn test_discover_read_error() {
        let stat = MockProcStat::dual_core();
        stat.fail_reads_after(Some(0));
        let mut source = ProcStatSource::new(stat);
        assert!(discover_cores(&mut source).is_err());
    }
}
