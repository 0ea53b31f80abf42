// Background slice computation with last-request-wins coalescing
//
// A dedicated thread owns the session; the caller talks to it over channels
// and never blocks on recomputation. Rapid slider movement queues many render
// requests; before servicing one, the worker drains its queue and only the
// newest pending render survives, so stale in-flight work is discarded
// instead of computed.

use crate::colormap::{PaletteId, SliceRaster};
use crate::mesh::Mesh;
use crate::session::{EngineConfig, SliceSession};
use crate::slice::SliceSpec;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

pub enum WorkerCommand {
    LoadSamples(String),
    LoadMesh(Box<Mesh>),
    Render {
        id: u64,
        spec: SliceSpec,
        palette: PaletteId,
    },
    Shutdown,
}

#[derive(Debug)]
pub enum WorkerEvent {
    SamplesLoaded {
        generation: u64,
        count: usize,
    },
    SamplesRejected(crate::samples::ParseError),
    MeshLoaded {
        generation: u64,
    },
    SliceReady {
        id: u64,
        spec: SliceSpec,
        raster: Arc<SliceRaster>,
    },
}

/// Handle to the background slice thread
pub struct SliceWorker {
    commands: Sender<WorkerCommand>,
    events: Receiver<WorkerEvent>,
    next_request: u64,
    handle: Option<JoinHandle<()>>,
}

impl SliceWorker {
    pub fn spawn(config: EngineConfig) -> Self {
        let (command_tx, command_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        let handle = std::thread::spawn(move || {
            worker_loop(config, command_rx, event_tx);
        });

        Self {
            commands: command_tx,
            events: event_rx,
            next_request: 0,
            handle: Some(handle),
        }
    }

    pub fn load_samples(&self, text: String) {
        let _ = self.commands.send(WorkerCommand::LoadSamples(text));
    }

    pub fn load_mesh(&self, mesh: Mesh) {
        let _ = self.commands.send(WorkerCommand::LoadMesh(Box::new(mesh)));
    }

    /// Queue a slice render and return its request id. A request queued
    /// behind a newer one is dropped without being computed.
    pub fn request_slice(&mut self, spec: SliceSpec, palette: PaletteId) -> u64 {
        self.next_request += 1;
        let id = self.next_request;
        let _ = self.commands.send(WorkerCommand::Render { id, spec, palette });
        id
    }

    /// Non-blocking event poll
    pub fn poll_event(&self) -> Option<WorkerEvent> {
        self.events.try_recv().ok()
    }

    /// Block up to `timeout` for the next event
    pub fn wait_event(&self, timeout: Duration) -> Option<WorkerEvent> {
        match self.events.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

impl Drop for SliceWorker {
    fn drop(&mut self) {
        let _ = self.commands.send(WorkerCommand::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn worker_loop(
    config: EngineConfig,
    commands: Receiver<WorkerCommand>,
    events: Sender<WorkerEvent>,
) {
    let mut session = SliceSession::new(config);

    loop {
        let first = match commands.recv() {
            Ok(command) => command,
            Err(_) => break, // all senders gone
        };

        // Pull in everything already queued so a burst of slider movement
        // collapses to a single recompute.
        let mut batch = vec![first];
        while let Ok(command) = commands.try_recv() {
            batch.push(command);
        }

        let last_render = batch
            .iter()
            .rposition(|c| matches!(c, WorkerCommand::Render { .. }));

        for (position, command) in batch.into_iter().enumerate() {
            match command {
                WorkerCommand::LoadSamples(text) => match session.load_samples(&text) {
                    Ok(()) => {
                        let _ = events.send(WorkerEvent::SamplesLoaded {
                            generation: session.generation(),
                            count: session.sample_count(),
                        });
                    }
                    Err(e) => {
                        log::warn!("Sample load rejected: {}", e);
                        let _ = events.send(WorkerEvent::SamplesRejected(e));
                    }
                },
                WorkerCommand::LoadMesh(mesh) => {
                    session.load_mesh(*mesh);
                    let _ = events.send(WorkerEvent::MeshLoaded {
                        generation: session.generation(),
                    });
                }
                WorkerCommand::Render { id, spec, palette } => {
                    if Some(position) != last_render {
                        log::debug!("Slice request {} superseded before compute", id);
                        continue;
                    }
                    let raster = session.render(&spec, palette);
                    let _ = events.send(WorkerEvent::SliceReady { id, spec, raster });
                }
                WorkerCommand::Shutdown => return,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Axis, Point3D, Triangle};

    fn make_quad_mesh() -> Mesh {
        // Thin closed-ish box stand-in: two triangles are enough for the
        // bounding-sphere strategy used below
        let triangles = vec![
            Triangle::new(
                Point3D::new(-5.0, -5.0, -5.0),
                Point3D::new(5.0, -5.0, -5.0),
                Point3D::new(5.0, 5.0, 5.0),
            ),
            Triangle::new(
                Point3D::new(-5.0, -5.0, -5.0),
                Point3D::new(5.0, 5.0, 5.0),
                Point3D::new(-5.0, 5.0, 5.0),
            ),
        ];
        Mesh::new(triangles).unwrap()
    }

    fn test_config() -> EngineConfig {
        EngineConfig {
            strategy: crate::containment::ContainmentStrategy::BoundingSphere { fraction: 0.8 },
            ..EngineConfig::default()
        }
    }

    fn spec(value: f64) -> SliceSpec {
        SliceSpec {
            axis: Axis::Z,
            value,
            resolution: 8,
        }
    }

    #[test]
    fn test_worker_renders_requested_slice() {
        let mut worker = SliceWorker::spawn(test_config());
        worker.load_mesh(make_quad_mesh());
        worker.load_samples("0 0 0 1.0\n1 1 1 2.0\n".to_string());

        let id = worker.request_slice(spec(0.0), PaletteId::Viridis);

        let mut ready = None;
        for _ in 0..100 {
            match worker.wait_event(Duration::from_millis(100)) {
                Some(WorkerEvent::SliceReady { id: got, raster, .. }) if got == id => {
                    ready = Some(raster);
                    break;
                }
                Some(_) => continue,
                None => break,
            }
        }

        let raster = ready.expect("worker should deliver the requested slice");
        assert_eq!(raster.width, 8);
    }

    #[test]
    fn test_last_request_wins() {
        let mut worker = SliceWorker::spawn(test_config());
        worker.load_mesh(make_quad_mesh());
        worker.load_samples("0 0 0 1.0\n1 1 1 2.0\n".to_string());

        // Burst of slider positions; only the newest queued request is
        // guaranteed a result, and the final delivered slice must be it
        let mut last_id = 0;
        for step in 0..20 {
            last_id = worker.request_slice(spec(step as f64 * 0.1), PaletteId::Viridis);
        }

        let mut final_slice = None;
        for _ in 0..200 {
            match worker.wait_event(Duration::from_millis(100)) {
                Some(WorkerEvent::SliceReady { id, .. }) => {
                    assert!(id <= last_id);
                    final_slice = Some(id);
                    if id == last_id {
                        break;
                    }
                }
                Some(_) => continue,
                None => break,
            }
        }

        assert_eq!(
            final_slice,
            Some(last_id),
            "the newest request must be the one ultimately delivered"
        );
    }

    #[test]
    fn test_rejected_samples_reported() {
        let worker = SliceWorker::spawn(test_config());
        worker.load_samples("not a sample line\n".to_string());

        let mut rejected = false;
        for _ in 0..100 {
            match worker.wait_event(Duration::from_millis(100)) {
                Some(WorkerEvent::SamplesRejected(_)) => {
                    rejected = true;
                    break;
                }
                Some(_) => continue,
                None => break,
            }
        }
        assert!(rejected, "malformed feed should be reported, not dropped");
    }

    #[test]
    fn test_drop_shuts_worker_down() {
        let worker = SliceWorker::spawn(test_config());
        drop(worker); // must not hang
    }
}
