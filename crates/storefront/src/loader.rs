//! Critical and deferred page data.
//!
//! A page handler loads in two phases:
//!
//! 1. **Deferred** loads are started first with [`Deferred::spawn`]. Each
//!    runs on its own task, concurrently with everything else.
//! 2. **Critical** loads are awaited together (`tokio::try_join!`). Any
//!    failure aborts the request with an error status and no HTML.
//!
//! The handler then renders the page shell and returns a [`StreamedPage`]:
//! the shell is sent at once with a placeholder per deferred section, and
//! each section follows as its load settles, in settlement order. A failed
//! deferred load is logged and rendered from `None`.
//!
//! Dropping a [`Deferred`] aborts its task, so a client that disconnects
//! mid-stream (or a critical failure) cancels outstanding loads.

use std::convert::Infallible;
use std::fmt::Display;
use std::future::Future;

use askama::Template;
use axum::body::Body;
use axum::http::{HeaderValue, header};
use axum::response::{IntoResponse, Response};
use futures::future::BoxFuture;
use futures::stream::{self, FuturesUnordered, StreamExt};
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::error::AppError;
use crate::middleware::CspNonce;

/// Closes the document after the last streamed section.
pub const DOCUMENT_TAIL: &str = "</body>\n</html>\n";

// =============================================================================
// Deferred
// =============================================================================

/// A load running on its own task whose failure is not fatal.
#[must_use = "dropping a Deferred aborts its load"]
pub struct Deferred<T> {
    name: &'static str,
    handle: JoinHandle<Option<T>>,
}

impl<T: Send + 'static> Deferred<T> {
    /// Start `load` now. Errors are logged and become `None`.
    pub fn spawn<F, E>(name: &'static str, load: F) -> Self
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let task = async move {
            match load.await {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!(section = name, error = %e, "Deferred load failed");
                    None
                }
            }
        };
        Self {
            name,
            handle: tokio::spawn(task.instrument(tracing::Span::current())),
        }
    }

    /// Wait for the load to settle.
    pub async fn settle(mut self) -> Option<T> {
        match (&mut self.handle).await {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(section = self.name, error = %e, "Deferred load task failed");
                None
            }
        }
    }
}

impl<T> Drop for Deferred<T> {
    fn drop(&mut self) {
        // No-op once the task has finished
        self.handle.abort();
    }
}

// =============================================================================
// StreamedPage
// =============================================================================

struct Section {
    id: &'static str,
    html: BoxFuture<'static, String>,
}

/// An HTML page whose deferred sections stream in after the shell.
#[must_use]
pub struct StreamedPage {
    shell: String,
    nonce: CspNonce,
    sections: Vec<Section>,
}

impl StreamedPage {
    /// Render the page shell.
    ///
    /// The shell must leave `<body>` open (see [`DOCUMENT_TAIL`]) and contain
    /// an element with the id of every section added later.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Template`] if the shell fails to render.
    pub fn new(shell: &impl Template, nonce: CspNonce) -> Result<Self, AppError> {
        Ok(Self {
            shell: shell.render()?,
            nonce,
            sections: Vec::new(),
        })
    }

    /// Stream the section `id`, rendered by `render` once `deferred` settles.
    pub fn section<T, F>(mut self, id: &'static str, deferred: Deferred<T>, render: F) -> Self
    where
        T: Send + 'static,
        F: FnOnce(Option<T>) -> String + Send + 'static,
    {
        self.sections.push(Section {
            id,
            html: Box::pin(async move { render(deferred.settle().await) }),
        });
        self
    }

    /// The chunk that replaces placeholder `id` with `html`.
    fn section_chunk(id: &str, html: &str, nonce: &CspNonce) -> String {
        format!(
            "<template id=\"{id}-content\">{html}</template>\
             <script nonce=\"{nonce}\">bwSwap(\"{id}\")</script>\n",
            nonce = nonce.value()
        )
    }
}

impl IntoResponse for StreamedPage {
    fn into_response(self) -> Response {
        let Self {
            shell,
            nonce,
            sections,
        } = self;

        let pending: FuturesUnordered<_> = sections
            .into_iter()
            .map(|section| async move { (section.id, section.html.await) })
            .collect();

        let body = stream::once(async move { shell })
            .chain(pending.map(move |(id, html)| Self::section_chunk(id, &html, &nonce)))
            .chain(stream::once(async { DOCUMENT_TAIL.to_string() }))
            .map(Ok::<_, Infallible>);

        let mut response = Body::from_stream(body).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/html; charset=utf-8"),
        );
        response
    }
}

/// Render a template for a streamed section, logging failures.
pub fn render_section(template: &impl Template) -> String {
    template.render().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to render streamed section");
        String::new()
    })
}
