//! Flood-fill connected-component extraction over a [`Mask`].
//!
//! Rows are split into bands (see [`partition_rows`]) and each band is scanned
//! by its own worker. A breadth-first fill with 8-connectivity grows every
//! unvisited foreground cell into a component; cells with at least one
//! in-bounds background neighbour are border cells and contribute an
//! [`OutlineRect`] to the component's outline. How fills behave at band seams
//! is controlled by [`BandPolicy`].

use std::collections::VecDeque;
use std::ops::Range;
use std::sync::Mutex;

use tracing::debug;

use crate::{
    error::{OutlineError, Result},
    parallel::{default_workers, fork_join, partition_rows, Partition},
    traits::RegionExtractor,
    types::{ensure_not_empty, BandPolicy, Mask, OutlineRect, Region},
};

const NEIGHBOURS: [(i64, i64); 8] = [
    (-1, -1), (0, -1), (1, -1),
    (-1, 0),           (1, 0),
    (-1, 1),  (0, 1),  (1, 1),
];

/// Multithreaded breadth-first flood-fill extractor
#[derive(Debug, Clone)]
pub struct FloodFillExtractor {
    pub workers: usize,
    pub policy: BandPolicy,
    pub outline_thickness: u32,
    pub min_size_fraction: f64,
}

impl Default for FloodFillExtractor {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            policy: BandPolicy::default(),
            outline_thickness: 1,
            min_size_fraction: 0.1,
        }
    }
}

/// Visitation flags for the rows a worker is allowed to fill
struct VisitedSet {
    width: usize,
    first_row: u32,
    cells: Vec<bool>,
}

impl VisitedSet {
    fn new(width: u32, rows: &Range<u32>) -> Self {
        Self {
            width: width as usize,
            first_row: rows.start,
            cells: vec![false; width as usize * rows.len()],
        }
    }

    /// Marks the cell and reports whether it was unvisited
    #[inline]
    fn insert(&mut self, x: u32, y: u32) -> bool {
        let index = (y - self.first_row) as usize * self.width + x as usize;
        !std::mem::replace(&mut self.cells[index], true)
    }

    #[inline]
    fn contains(&self, x: u32, y: u32) -> bool {
        self.cells[(y - self.first_row) as usize * self.width + x as usize]
    }
}

/// One band-local piece of a component
struct Fragment {
    band: usize,
    /// 1-based order in which the band discovered this fragment
    label: u32,
    outline: Vec<OutlineRect>,
    border: Vec<(u32, u32)>,
    area: usize,
}

impl FloodFillExtractor {
    pub fn new(workers: usize) -> Self {
        Self {
            workers,
            ..Self::default()
        }
    }

    pub fn with_policy(mut self, policy: BandPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn validate(&self, mask: &Mask) -> Result<()> {
        ensure_not_empty(mask.width(), mask.height())?;
        OutlineError::check_range("workers", self.workers as f64, 1.0, f64::from(u32::MAX))?;
        OutlineError::check_range("outline_thickness", self.outline_thickness, 1, u32::MAX)?;
        OutlineError::check_range("min_size_fraction", self.min_size_fraction, 0.0, 1.0)
    }

    fn retain(&self, region: &Region, mask: &Mask) -> bool {
        region.is_large_enough(mask.width(), mask.height(), self.min_size_fraction)
    }

    /// Scan `partition` and flood-fill every component seeded inside it.
    ///
    /// `labels`, when given, covers exactly the partition's rows and receives
    /// the fragment label of every filled cell.
    fn scan_band(
        &self,
        mask: &Mask,
        partition: Partition,
        mut labels: Option<&mut [u32]>,
    ) -> Vec<Fragment> {
        let fill_rows = match self.policy {
            BandPolicy::Unbounded => 0..mask.height(),
            BandPolicy::Clipped | BandPolicy::Stitched => partition.start..partition.end,
        };
        let mut visited = VisitedSet::new(mask.width(), &fill_rows);
        let mut fragments = Vec::new();

        for y in partition.start..partition.end {
            for x in 0..mask.width() {
                if !mask.get(x, y) || visited.contains(x, y) {
                    continue;
                }
                let label = fragments.len() as u32 + 1;
                let mut area = 0;
                let border = self.flood_fill(mask, &mut visited, &fill_rows, (x, y), |cx, cy| {
                    area += 1;
                    if let Some(labels) = labels.as_deref_mut() {
                        let row = (cy - partition.start) as usize;
                        labels[row * mask.width() as usize + cx as usize] = label;
                    }
                });
                let outline = border
                    .iter()
                    .map(|&(bx, by)| {
                        OutlineRect::around(bx, by, self.outline_thickness, mask.width(), mask.height())
                    })
                    .collect();
                fragments.push(Fragment {
                    band: partition.index,
                    label,
                    outline,
                    border,
                    area,
                });
            }
        }
        fragments
    }

    /// Breadth-first fill from `seed`, returning the component's border cells in visit order
    fn flood_fill<F>(
        &self,
        mask: &Mask,
        visited: &mut VisitedSet,
        fill_rows: &Range<u32>,
        seed: (u32, u32),
        mut on_cell: F,
    ) -> Vec<(u32, u32)>
    where
        F: FnMut(u32, u32),
    {
        let (width, height) = mask.dimensions();
        let mut border = Vec::new();
        let mut queue = VecDeque::from([seed]);
        visited.insert(seed.0, seed.1);

        while let Some((x, y)) = queue.pop_front() {
            on_cell(x, y);
            let mut is_border = false;

            for (dx, dy) in NEIGHBOURS {
                let nx = i64::from(x) + dx;
                let ny = i64::from(y) + dy;
                if nx < 0 || ny < 0 || nx >= i64::from(width) || ny >= i64::from(height) {
                    continue;
                }
                let (nx, ny) = (nx as u32, ny as u32);

                if !mask.get(nx, ny) {
                    is_border = true;
                } else if fill_rows.contains(&ny) && visited.insert(nx, ny) {
                    queue.push_back((nx, ny));
                }
            }

            if is_border {
                border.push((x, y));
            }
        }
        border
    }

    /// Each worker filters its own fragments and appends the survivors.
    fn extract_per_band(&self, mask: &Mask, partitions: Vec<Partition>) -> Result<Vec<Region>> {
        let results: Mutex<Vec<Region>> = Mutex::new(Vec::new());
        let jobs = partitions.into_iter().map(|p| (p, ())).collect();

        fork_join("extract", jobs, |partition, ()| {
            let retained: Vec<Region> = self
                .scan_band(mask, partition, None)
                .into_iter()
                .filter_map(|f| Region::from_outline(f.outline, f.border, f.area))
                .filter(|r| self.retain(r, mask))
                .collect();
            results.lock().map_err(|_| poisoned())?.extend(retained);
            Ok(())
        })?;

        results.into_inner().map_err(|_| poisoned())
    }

    /// Every fragment is collected, then fragments touching across a seam are merged.
    fn extract_stitched(&self, mask: &Mask, partitions: Vec<Partition>) -> Result<Vec<Region>> {
        let width = mask.width() as usize;
        let band_count = partitions.iter().map(|p| p.index + 1).max().unwrap_or(0);
        let mut labels = vec![0u32; width * mask.height() as usize];
        let fragments: Mutex<Vec<Fragment>> = Mutex::new(Vec::new());

        let mut jobs = Vec::with_capacity(partitions.len());
        let mut remaining: &mut [u32] = &mut labels;
        for partition in partitions.iter().copied() {
            let (band, rest) = remaining.split_at_mut(partition.rows() as usize * width);
            remaining = rest;
            jobs.push((partition, band));
        }

        fork_join("extract", jobs, |partition, band_labels| {
            let found = self.scan_band(mask, partition, Some(band_labels));
            fragments.lock().map_err(|_| poisoned())?.extend(found);
            Ok(())
        })?;

        let mut fragments = fragments.into_inner().map_err(|_| poisoned())?;
        fragments.sort_by_key(|f| (f.band, f.label));

        // index of each band's first fragment in the sorted list
        let mut band_base = vec![0usize; band_count];
        for (i, fragment) in fragments.iter().enumerate().rev() {
            band_base[fragment.band] = i;
        }
        let global = |band: usize, label: u32| band_base[band] + label as usize - 1;

        let mut sets = DisjointSet::new(fragments.len());
        let bands: Vec<&Partition> = partitions.iter().filter(|p| !p.is_empty()).collect();
        for pair in bands.windows(2) {
            let (upper, lower) = (pair[0], pair[1]);
            let top_row = (upper.end - 1) as usize * width;
            let bottom_row = lower.start as usize * width;
            for x in 0..width {
                let above = labels[top_row + x];
                if above == 0 {
                    continue;
                }
                for nx in x.saturating_sub(1)..(x + 2).min(width) {
                    let below = labels[bottom_row + nx];
                    if below != 0 {
                        sets.union(global(upper.index, above), global(lower.index, below));
                    }
                }
            }
        }

        let mut slot_of_root: Vec<Option<usize>> = vec![None; fragments.len()];
        let mut merged: Vec<Fragment> = Vec::new();
        for (i, fragment) in fragments.into_iter().enumerate() {
            let root = sets.find(i);
            match slot_of_root[root] {
                Some(slot) => {
                    let target = &mut merged[slot];
                    target.outline.extend(fragment.outline);
                    target.border.extend(fragment.border);
                    target.area += fragment.area;
                }
                None => {
                    slot_of_root[root] = Some(merged.len());
                    merged.push(fragment);
                }
            }
        }

        Ok(merged
            .into_iter()
            .filter_map(|f| Region::from_outline(f.outline, f.border, f.area))
            .filter(|r| self.retain(r, mask))
            .collect())
    }
}

impl RegionExtractor for FloodFillExtractor {
    fn extract(&self, mask: &Mask) -> Result<Vec<Region>> {
        self.validate(mask)?;
        let partitions: Vec<Partition> = partition_rows(mask.height(), self.workers)
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect();

        let regions = match self.policy {
            BandPolicy::Stitched => self.extract_stitched(mask, partitions)?,
            BandPolicy::Unbounded | BandPolicy::Clipped => self.extract_per_band(mask, partitions)?,
        };

        debug!(
            policy = %self.policy,
            workers = self.workers,
            regions = regions.len(),
            "region extraction finished"
        );
        Ok(regions)
    }
}

fn poisoned() -> OutlineError {
    OutlineError::WorkerFailure {
        stage: "extract",
        failed: 1,
        total: 1,
        details: "result collection lock poisoned".to_string(),
    }
}

/// Union-find over fragment indices
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    /// The smaller index becomes the root so merged regions keep scan order
    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            let (root, child) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[child] = root;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: u32, x0: u32, y0: u32, side: u32) -> Mask {
        Mask::from_fn(size, size, |x, y| {
            x >= x0 && x < x0 + side && y >= y0 && y < y0 + side
        })
    }

    fn extractor(workers: usize, policy: BandPolicy) -> FloodFillExtractor {
        FloodFillExtractor::new(workers).with_policy(policy)
    }

    /// Order-independent view of a region list
    fn normalized(mut regions: Vec<Region>) -> Vec<(u32, u32, u32, u32, usize, Vec<OutlineRect>)> {
        let mut view: Vec<_> = regions
            .drain(..)
            .map(|mut r| {
                r.outline.sort_by_key(|o| (o.y, o.x));
                (r.bounds.min_x, r.bounds.max_x, r.bounds.min_y, r.bounds.max_y, r.area, r.outline)
            })
            .collect();
        view.sort();
        view
    }

    #[test]
    fn test_small_blob_is_rejected() {
        let mask = square(100, 40, 40, 2);
        let regions = extractor(1, BandPolicy::Stitched).extract(&mask).unwrap();
        assert!(regions.is_empty());
    }

    #[test]
    fn test_large_blob_is_retained() {
        let mask = square(100, 40, 40, 11);
        let regions = extractor(1, BandPolicy::Stitched).extract(&mask).unwrap();
        assert_eq!(regions.len(), 1);

        let region = &regions[0];
        assert_eq!(region.area, 121);
        assert_eq!((region.bounds.width(), region.bounds.height()), (11, 11));
        // only the ring of the square touches background
        assert_eq!(region.outline.len(), 11 * 4 - 4);
    }

    #[test]
    fn test_diagonal_cells_are_connected() {
        let mask = Mask::from_fn(20, 20, |x, y| x == y);
        let regions = extractor(1, BandPolicy::Stitched).extract(&mask).unwrap();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].area, 20);
    }

    #[test]
    fn test_image_edge_is_not_a_border() {
        // every cell is foreground, so no cell has a background neighbour
        let mask = Mask::from_fn(30, 30, |_, _| true);
        let regions = extractor(2, BandPolicy::Stitched).extract(&mask).unwrap();
        assert!(regions.is_empty());
    }

    #[test]
    fn test_empty_mask_yields_nothing() {
        let mask = Mask::new(50, 50);
        for policy in [BandPolicy::Unbounded, BandPolicy::Clipped, BandPolicy::Stitched] {
            assert!(extractor(4, policy).extract(&mask).unwrap().is_empty());
        }
    }

    #[test]
    fn test_worker_count_does_not_change_band_local_regions() {
        // two blobs, each inside one band for both 1 and 4 workers
        let mask = Mask::from_fn(100, 100, |x, y| {
            ((10..25).contains(&x) && (2..17).contains(&y)) || ((50..70).contains(&x) && (60..74).contains(&y))
        });
        for policy in [BandPolicy::Unbounded, BandPolicy::Clipped, BandPolicy::Stitched] {
            let single = extractor(1, policy).extract(&mask).unwrap();
            let multi = extractor(4, policy).extract(&mask).unwrap();
            assert_eq!(single.len(), 2, "{policy}");
            assert_eq!(normalized(single), normalized(multi), "{policy}");
        }
    }

    #[test]
    fn test_stitched_merges_across_seams() {
        // 40 rows tall blob crossing every seam of a 4-way split
        let mask = square(100, 20, 30, 40);
        let single = extractor(1, BandPolicy::Stitched).extract(&mask).unwrap();
        let multi = extractor(4, BandPolicy::Stitched).extract(&mask).unwrap();
        assert_eq!(multi.len(), 1);
        assert_eq!(multi[0].area, 1600);
        assert_eq!(normalized(single), normalized(multi));
    }

    #[test]
    fn test_clipped_splits_at_seams() {
        // rows 40..60 straddle the seam at row 50 of a 2-way split
        let mask = square(100, 20, 40, 20);
        let regions = extractor(2, BandPolicy::Clipped).extract(&mask).unwrap();
        assert_eq!(regions.len(), 2);
        assert!(regions.iter().all(|r| r.area == 200));
    }

    #[test]
    fn test_unbounded_may_report_twice() {
        let mask = square(100, 20, 40, 20);
        let regions = extractor(2, BandPolicy::Unbounded).extract(&mask).unwrap();
        // each band fills the whole blob with its own visited set
        assert_eq!(regions.len(), 2);
        assert!(regions.iter().all(|r| r.area == 400));
    }

    #[test]
    fn test_stitched_order_matches_single_worker_scan_order() {
        let mask = Mask::from_fn(100, 100, |x, y| {
            ((70..82).contains(&x) && (45..57).contains(&y)) || ((5..20).contains(&x) && (5..20).contains(&y))
        });
        let regions = extractor(3, BandPolicy::Stitched).extract(&mask).unwrap();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].bounds.min_y, 5);
        assert_eq!(regions[1].bounds.min_y, 45);
    }

    #[test]
    fn test_thick_outline_is_clipped() {
        let mask = square(40, 0, 0, 10);
        let mut extractor = extractor(1, BandPolicy::Stitched);
        extractor.outline_thickness = 3;
        let regions = extractor.extract(&mask).unwrap();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].bounds.min_x, 0);
        assert_eq!(regions[0].bounds.max_x, 10);
    }

    #[test]
    fn test_overlap_does_not_depend_on_thickness() {
        let mask = square(60, 15, 15, 30);
        for thickness in [1, 3, 5] {
            let mut extractor = extractor(2, BandPolicy::Stitched);
            extractor.outline_thickness = thickness;
            let regions = extractor.extract(&mask).unwrap();
            assert_eq!(regions.len(), 1);
            assert_eq!(regions[0].border.len(), 30 * 4 - 4);
            assert_eq!(regions[0].overlap_with(&mask), 1.0, "thickness = {thickness}");
        }
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let mask = square(20, 2, 2, 5);
        let mut bad = extractor(1, BandPolicy::Stitched);
        bad.outline_thickness = 0;
        assert!(matches!(bad.extract(&mask), Err(OutlineError::InvalidParameter { .. })));

        let zero_workers = extractor(0, BandPolicy::Stitched);
        assert!(zero_workers.extract(&mask).is_err());

        assert!(matches!(
            extractor(1, BandPolicy::Stitched).extract(&Mask::new(0, 3)),
            Err(OutlineError::InvalidImage { .. })
        ));
    }
}
