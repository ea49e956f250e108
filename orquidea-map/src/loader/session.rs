//! Cycle de vie d'un chargement : montage, publication, démontage

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use geodepto::FeatureCollection;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::fetch::Fetch;
use super::sources::GeometryLoader;

/// État publié pour le rendu
#[derive(Debug, Clone)]
pub enum MapState {
    /// Rien de chargé pour l'instant
    Loading,
    /// Géométrie disponible
    Ready(Arc<FeatureCollection>),
    /// Toutes les sources ont échoué : message à afficher tel quel
    Failed(String),
}

impl MapState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn collection(&self) -> Option<&FeatureCollection> {
        match self {
            Self::Ready(collection) => Some(collection.as_ref()),
            _ => None,
        }
    }
}

/// Un chargement lancé une seule fois au montage
///
/// Le démontage (explicite ou par `Drop`) lève un drapeau vérifié avant de
/// publier : les requêtes en cours ne sont pas interrompues, leur résultat
/// est ignoré.
pub struct MapSession {
    state: watch::Receiver<MapState>,
    cancelled: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl MapSession {
    /// Lance le chargement sur le runtime tokio courant
    pub fn mount<F: Fetch + 'static>(loader: GeometryLoader<F>) -> Self {
        let (tx, rx) = watch::channel(MapState::Loading);
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);

        let task = tokio::spawn(async move {
            let outcome = loader.load().await;

            if flag.load(Ordering::Acquire) {
                debug!("Session unmounted, discarding load result");
                return;
            }

            let state = match outcome {
                Ok(collection) => MapState::Ready(Arc::new(collection)),
                Err(e) => {
                    warn!("Map data unavailable: {}", e);
                    MapState::Failed(e.to_string())
                }
            };

            // Drapeau relu sous le verrou d'écriture du canal : un démontage
            // concurrent ne peut plus s'intercaler avant la publication
            let published = tx.send_if_modified(|current| {
                if flag.load(Ordering::Acquire) {
                    return false;
                }
                *current = state;
                true
            });
            if !published {
                debug!("Session unmounted during publication, result discarded");
            }
        });

        Self {
            state: rx,
            cancelled,
            task,
        }
    }

    /// État courant
    pub fn state(&self) -> MapState {
        self.state.borrow().clone()
    }

    /// Nouveau récepteur sur l'état publié
    pub fn subscribe(&self) -> watch::Receiver<MapState> {
        self.state.clone()
    }

    /// Démonte la session : plus aucun état ne sera publié
    ///
    /// Au retour, une publication déjà engagée est terminée et toute autre
    /// est refusée.
    pub fn unmount(&self) {
        self.cancelled.store(true, Ordering::Release);
        // Attend la libération du verrou si une publication est en cours
        drop(self.state.borrow());
    }

    pub fn is_unmounted(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Attend le premier état définitif
    ///
    /// Retourne `Loading` si la tâche se termine sans rien publier (session
    /// démontée).
    pub async fn settled(&mut self) -> MapState {
        loop {
            {
                let current = self.state.borrow_and_update();
                if !current.is_loading() {
                    return current.clone();
                }
            }
            if self.state.changed().await.is_err() {
                return self.state.borrow().clone();
            }
        }
    }

    /// Vrai quand la tâche de chargement est terminée
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for MapSession {
    fn drop(&mut self) {
        self.unmount();
    }
}
