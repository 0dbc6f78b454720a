use crossbeam_channel::{Receiver, Sender, unbounded};

/// Observer of a coordinator's progress.
pub trait ProgressSubscriber {
    /// `progress` is the finished fraction in `0.0..=1.0`.
    fn notify_progress(&mut self, progress: f32);

    /// Called once when the job finishes or is cancelled.
    fn notify_end(&mut self);
}

impl<S: ProgressSubscriber + ?Sized> ProgressSubscriber for Box<S> {
    fn notify_progress(&mut self, progress: f32) {
        (**self).notify_progress(progress);
    }

    fn notify_end(&mut self) {
        (**self).notify_end();
    }
}

/// Logs progress every `step` (fraction) under a label.
pub struct LoggingSubscriber {
    label: String,
    step: f32,
    next: f32,
}

impl LoggingSubscriber {
    pub fn new(label: impl Into<String>, step: f32) -> Self {
        let step = step.clamp(0.01, 1.0);
        Self {
            label: label.into(),
            step,
            next: step,
        }
    }
}

impl ProgressSubscriber for LoggingSubscriber {
    fn notify_progress(&mut self, progress: f32) {
        if progress + f32::EPSILON < self.next {
            return;
        }
        log::info!("{}: {:.0}%", self.label, progress * 100.0);
        while self.next <= progress + f32::EPSILON {
            self.next += self.step;
        }
    }

    fn notify_end(&mut self) {
        log::info!("{}: done", self.label);
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ProgressEvent {
    Progress(f32),
    End,
}

/// Forwards progress to another thread.
pub struct ChannelSubscriber {
    tx: Sender<ProgressEvent>,
}

impl ChannelSubscriber {
    pub fn new() -> (Self, Receiver<ProgressEvent>) {
        let (tx, rx) = unbounded();
        (Self { tx }, rx)
    }
}

impl ProgressSubscriber for ChannelSubscriber {
    fn notify_progress(&mut self, progress: f32) {
        // Receiver may be gone; progress is advisory.
        let _ = self.tx.send(ProgressEvent::Progress(progress));
    }

    fn notify_end(&mut self) {
        let _ = self.tx.send(ProgressEvent::End);
    }
}
