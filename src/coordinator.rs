use crate::animation::ConnectedAnimationService;
use crate::backend::Backend;
use crate::error::TransitionError;
use crate::record::ScreenKey;
use crate::transition::{InsertionMode, NavigationMode, TransitionContext, Visual};
use parking_lot::Mutex;

/// The ordered visuals currently shown by a frame, bottom first.
///
/// Every change is mirrored to the backend.
#[derive(Debug, Default)]
pub struct ContentRoot {
    children: Vec<Visual>,
}

impl ContentRoot {
    pub fn new() -> ContentRoot {
        ContentRoot::default()
    }

    pub fn keys(&self) -> Vec<ScreenKey> {
        self.children.iter().map(Visual::key).collect()
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    fn contains(&self, key: ScreenKey) -> bool {
        self.children.iter().any(|visual| visual.key() == key)
    }

    fn insert(&mut self, index: usize, visual: Visual, backend: &dyn Backend) {
        let index = index.min(self.children.len());
        backend.insert_visual(index, &visual);
        self.children.insert(index, visual);
    }

    fn push(&mut self, visual: Visual, backend: &dyn Backend) {
        let index = self.children.len();
        self.insert(index, visual, backend);
    }

    fn remove(&mut self, key: ScreenKey, backend: &dyn Backend) {
        if let Some(pos) = self.children.iter().position(|visual| visual.key() == key) {
            let visual = self.children.remove(pos);
            backend.remove_visual(&visual);
        }
    }
}

/// Swaps the outgoing visual for the incoming one, running the context’s transition if there is
/// one.
///
/// The outgoing screen is asked to prepare connected animations before anything happens and the
/// incoming screen may use them once its visual is in place. Without a transition, the outgoing
/// visual is removed and the incoming one added right away.
///
/// The outgoing visual is removed even if the transition fails; the error is returned afterwards.
/// No locks are held while the transition runs.
pub(crate) async fn swap(
    context: &TransitionContext,
    outgoing: Option<Visual>,
    incoming: Visual,
    content: &Mutex<ContentRoot>,
    backend: &dyn Backend,
    animations: &ConnectedAnimationService,
) -> Result<(), TransitionError> {
    // refreshing a screen in place
    let outgoing = outgoing.filter(|visual| visual.key() != incoming.key());

    if let Some(outgoing) = &outgoing {
        outgoing.screen().lock().prepare_connected_animation(animations);
    }

    let transition = match &context.transition {
        Some(transition) => transition,
        None => {
            {
                let mut content = content.lock();
                if let Some(outgoing) = &outgoing {
                    content.remove(outgoing.key(), backend);
                }
                if !content.contains(incoming.key()) {
                    content.push(incoming.clone(), backend);
                }
            }
            incoming.screen().lock().use_connected_animation(animations);
            return Ok(());
        }
    };

    {
        let mut content = content.lock();
        if !content.contains(incoming.key()) {
            match transition.insertion_mode() {
                InsertionMode::IncomingAbove => content.push(incoming.clone(), backend),
                InsertionMode::IncomingBelow => content.insert(0, incoming.clone(), backend),
            }
        }
    }
    incoming.screen().lock().use_connected_animation(animations);

    tracing::trace!(mode = ?context.mode, to = %incoming.key(), "running transition");
    let result = match (context.mode, &outgoing) {
        (NavigationMode::Back, Some(outgoing)) => transition.on_close(outgoing, &incoming).await,
        (_, outgoing) => transition.on_start(&incoming, outgoing.as_ref()).await,
    };

    if let Some(outgoing) = &outgoing {
        content.lock().remove(outgoing.key(), backend);
    }
    result
}
