//! A dedicated background thread per map draining queued grid work in FIFO
//! order. Queued actions carry a liveness token so work enqueued for a map
//! that has since despawned is discarded instead of run, and callers fall
//! back to running inline when the thread is unavailable.
//!

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{channel, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;

use bevy::log::debug;

/// Generation value marking a map as permanently retired, tokens issued at or
/// after retirement are dead on arrival
const RETIRED_GENERATION: u64 = u64::MAX;

/// Generation counter tracking whether a map is still in play. Retirement is
/// permanent: it expires every token already handed out and every token
/// issued afterwards
#[derive(Default, Clone)]
pub struct MapLiveness {
	/// Current generation, set to [RETIRED_GENERATION] on retirement
	generation: Arc<AtomicU64>,
}

impl MapLiveness {
	/// Create a new instance of [MapLiveness] for a live map
	pub fn new() -> Self {
		MapLiveness {
			generation: Arc::new(AtomicU64::new(0)),
		}
	}
	/// A token that stays live until the map retires. Tokens minted after
	/// retirement are already dead
	pub fn token(&self) -> LivenessToken {
		LivenessToken {
			generation: Arc::clone(&self.generation),
			expected: self.generation.load(Ordering::Acquire),
		}
	}
	/// Whether the map has been retired
	pub fn is_retired(&self) -> bool {
		self.generation.load(Ordering::Acquire) == RETIRED_GENERATION
	}
	/// Permanently expire every outstanding and future token, queued work for
	/// the map becomes a no-op
	pub fn retire(&self) {
		self.generation.store(RETIRED_GENERATION, Ordering::Release);
	}
}

/// Snapshot of a map's liveness at enqueue time
pub struct LivenessToken {
	/// Shared generation counter of the issuing map
	generation: Arc<AtomicU64>,
	/// Generation observed when the token was issued
	expected: u64,
}

impl LivenessToken {
	/// Whether the issuing map is still in play
	pub fn is_live(&self) -> bool {
		self.expected != RETIRED_GENERATION
			&& self.generation.load(Ordering::Acquire) == self.expected
	}
}

/// A unit of grid work bound to the liveness of the map it was queued for
pub struct QueuedAction {
	/// The work to run
	work: Box<dyn FnOnce() + Send + 'static>,
	/// Liveness of the issuing map at enqueue time
	liveness: LivenessToken,
}

impl QueuedAction {
	/// Create a new instance of [QueuedAction]
	pub fn new(liveness: LivenessToken, work: impl FnOnce() + Send + 'static) -> Self {
		QueuedAction {
			work: Box::new(work),
			liveness,
		}
	}
	/// Whether the issuing map is still in play
	pub fn is_live(&self) -> bool {
		self.liveness.is_live()
	}
	/// Run the work unconditionally, consuming the action
	pub fn run(self) {
		(self.work)();
	}
}

/// Messages accepted by the worker thread
enum WorkerMessage {
	/// Run an action if its map is still live
	Run(QueuedAction),
	/// Drain out and exit
	Shutdown,
}

/// Clears the worker's alive flag when the thread exits, whether it returned
/// or unwound out of a panicking action
struct AliveGuard(Arc<AtomicBool>);

impl Drop for AliveGuard {
	fn drop(&mut self) {
		self.0.store(false, Ordering::Release);
	}
}

/// A dedicated thread draining [QueuedAction]s in FIFO order for one map
pub struct DedicatedWorker {
	/// Channel into the worker thread
	sender: Sender<WorkerMessage>,
	/// Handle joined on drop
	handle: Option<JoinHandle<()>>,
	/// Whether the thread is still draining the queue
	alive: Arc<AtomicBool>,
}

impl DedicatedWorker {
	/// Create a new instance of [DedicatedWorker] with its thread running
	pub fn new(name: &str) -> Self {
		let (sender, receiver) = channel::<WorkerMessage>();
		let alive = Arc::new(AtomicBool::new(true));
		let thread_alive = Arc::clone(&alive);
		let handle = std::thread::Builder::new()
			.name(name.to_string())
			.spawn(move || {
				let _guard = AliveGuard(thread_alive);
				while let Ok(message) = receiver.recv() {
					match message {
						WorkerMessage::Run(action) => {
							if action.is_live() {
								action.run();
							} else {
								debug!("Discarding queued action for a retired map");
							}
						}
						WorkerMessage::Shutdown => break,
					}
				}
			})
			.unwrap_or_else(|e| panic!("Failed to spawn pathing worker thread `{}`: {}", name, e));
		DedicatedWorker {
			sender,
			handle: Some(handle),
			alive,
		}
	}
	/// Whether the thread is still draining the queue. A panicking action
	/// kills the thread, after which callers run work inline instead
	pub fn thread_available(&self) -> bool {
		self.alive.load(Ordering::Acquire)
	}
	/// Enqueue an action, handing it back for inline execution when the
	/// thread is unavailable
	pub fn queue(&self, action: QueuedAction) -> Result<(), QueuedAction> {
		if !self.thread_available() {
			return Err(action);
		}
		self.sender
			.send(WorkerMessage::Run(action))
			.map_err(|failed| match failed.0 {
				WorkerMessage::Run(action) => action,
				// only Run messages are handed to this send
				WorkerMessage::Shutdown => unreachable!(),
			})
	}
}

impl Drop for DedicatedWorker {
	fn drop(&mut self) {
		// best effort, the thread may already have exited
		let _ = self.sender.send(WorkerMessage::Shutdown);
		if let Some(handle) = self.handle.take() {
			let _ = handle.join();
		}
	}
}
