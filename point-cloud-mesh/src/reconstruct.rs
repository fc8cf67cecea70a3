/// Main reconstruction pipeline from point cloud to shaded mesh.
use crate::bounds::PointCloudBounds;
use crate::constants::MIN_POINTS;
use crate::error::{ReconstructError, Result, reserve};
use crate::logging::{LogSink, LogTag, ScopedTimer};
use crate::mesh::{MeshBuffers, Point, assemble_vertices};
use crate::normals::NormalAccumulator;
use crate::resolver::resolve_triangles;
use crate::settings::{Execution, ReconstructSettings};
use crate::spatial_index::{Backing, SpatialIndex};
use crate::triangulation::{DelaunayTriangulator, Triangulator};

/// Reconstruct with default settings, the Delaunay engine and no logging.
pub fn reconstruct_points(points: &[Point]) -> Result<MeshBuffers> {
    reconstruct(
        points,
        &ReconstructSettings::default(),
        &DelaunayTriangulator,
        &LogSink::Silent,
    )
}

/// Run the full pipeline and return owned buffers.
///
/// Phases run one after another; inside a phase work may fan out over the
/// rayon pool. Any failure drops whatever was allocated so far.
pub fn reconstruct(
    points: &[Point],
    settings: &ReconstructSettings,
    triangulator: &dyn Triangulator,
    log: &LogSink,
) -> Result<MeshBuffers> {
    if points.len() < MIN_POINTS {
        return Err(ReconstructError::TooFewPoints(points.len()));
    }
    if u32::try_from(points.len()).is_err() {
        return Err(ReconstructError::Alloc("vertex buffer"));
    }

    log.log(LogTag::Begin, "reconstruct: begin");
    tracing::debug!(
        points = points.len(),
        mode = ?settings.mode,
        tolerance = settings.tolerance,
        "reconstruct: begin"
    );

    let runner = PhaseRunner::new(settings, log);
    let result = run_phases(points, settings, &runner, triangulator, log);

    match &result {
        Ok(mesh) => log.log(
            LogTag::Ok,
            &format!(
                "reconstruct: ok ({} vertices, {} triangles)",
                mesh.vertex_count(),
                mesh.triangle_count()
            ),
        ),
        Err(err) => log.log(LogTag::Error, &format!("reconstruct: {err}")),
    }
    result
}

/// Executes the data-parallel part of a phase.
/// Orchestration and logging stay on the calling thread; only the phase
/// body is moved onto the pool.
enum PhaseRunner {
    Pool(rayon::ThreadPool),
    Sequential,
}

impl PhaseRunner {
    fn new(settings: &ReconstructSettings, log: &LogSink) -> Self {
        if settings.execution == Execution::Sequential {
            return PhaseRunner::Sequential;
        }
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(threads) = settings.worker_threads {
            builder = builder.num_threads(threads);
        }
        match builder.build() {
            Ok(pool) => PhaseRunner::Pool(pool),
            Err(err) => {
                tracing::warn!(%err, "thread pool unavailable, running sequentially");
                log.log(LogTag::Warn, "thread pool unavailable, running sequentially");
                PhaseRunner::Sequential
            }
        }
    }

    fn run<R: Send>(&self, phase: impl FnOnce(Execution) -> R + Send) -> R {
        match self {
            PhaseRunner::Pool(pool) => pool.install(|| phase(Execution::Parallel)),
            PhaseRunner::Sequential => phase(Execution::Sequential),
        }
    }
}

fn run_phases(
    points: &[Point],
    settings: &ReconstructSettings,
    runner: &PhaseRunner,
    triangulator: &dyn Triangulator,
    log: &LogSink,
) -> Result<MeshBuffers> {
    let bounds = {
        let _t = ScopedTimer::new("Bounds", log);
        runner.run(|execution| PointCloudBounds::scan(points, execution))
    };

    let index = {
        let _t = ScopedTimer::new("SpatialIndex", log);
        SpatialIndex::build(points, &bounds, settings.cell_size, settings.grid_capacity)?
    };
    match index.backing() {
        Backing::Dense => log.log(LogTag::Grid, "use flat grid"),
        Backing::Sparse => log.log(LogTag::Grid, "use hash map fallback"),
    }

    let triangles = {
        let _t = ScopedTimer::new("Delaunay", log);
        let mut planar = Vec::new();
        reserve(&mut planar, points.len(), "planar projection")?;
        planar.extend(points.iter().map(|p| [p.x, p.y]));
        triangulator.triangulate(&planar)?
    };

    let (indices, stats) = {
        let _t = ScopedTimer::new("Resolve", log);
        resolve_triangles(&triangles, &index)?
    };
    drop(triangles);
    drop(index);
    tracing::debug!(
        kept = stats.kept,
        unresolved = stats.unresolved,
        degenerate = stats.degenerate,
        "triangles resolved"
    );

    let mut vertices = {
        let _t = ScopedTimer::new("Fill", log);
        runner.run(|execution| assemble_vertices(points, &bounds, execution))?
    };

    {
        let _t = ScopedTimer::new("Normals", log);
        let accumulator = NormalAccumulator::new(vertices.len())?;
        let batch_size = settings.normal_batch_size;
        runner.run(|execution| accumulator.accumulate(&vertices, &indices, batch_size, execution))?;
        runner.run(|execution| accumulator.normalise_into(&mut vertices, execution));
    }

    Ok(MeshBuffers { vertices, indices })
}
