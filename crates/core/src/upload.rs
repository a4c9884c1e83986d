//! Upload collaborator seam
//!
//! The tree hands upload requests to an [`Uploader`] and gets the outcome
//! back later through [`FormTree::finish_upload`], keyed by ticket.

use crate::error::FormError;
use crate::tree::{Delivery, FormTree, WidgetId};
use semform_types::{UploadError, UploadRequest, UploadResponse, UploadTicket};
use std::cell::RefCell;
use std::rc::Rc;

/// Transport for file uploads
pub trait Uploader {
    /// Start uploading. The integrator must call
    /// [`FormTree::finish_upload`] with the same ticket exactly once, unless
    /// this returns an error.
    fn submit(&mut self, ticket: UploadTicket, request: UploadRequest) -> Result<(), UploadError>;
}

/// Uploader that only records requests; completions are driven by hand
#[derive(Debug, Clone, Default)]
pub struct RecordingUploader {
    requests: Rc<RefCell<Vec<(UploadTicket, UploadRequest)>>>,
}

impl RecordingUploader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests submitted so far; clones share the same list
    pub fn requests(&self) -> Vec<(UploadTicket, UploadRequest)> {
        self.requests.borrow().clone()
    }

    pub fn last_ticket(&self) -> Option<UploadTicket> {
        self.requests.borrow().last().map(|(ticket, _)| *ticket)
    }
}

impl Uploader for RecordingUploader {
    fn submit(&mut self, ticket: UploadTicket, request: UploadRequest) -> Result<(), UploadError> {
        self.requests.borrow_mut().push((ticket, request));
        Ok(())
    }
}

impl FormTree {
    pub fn set_uploader(&mut self, uploader: Box<dyn Uploader>) {
        self.uploader = Some(uploader);
    }

    /// Tickets still waiting for a response
    pub fn pending_uploads(&self) -> Vec<UploadTicket> {
        let mut tickets: Vec<_> = self.tickets.keys().copied().collect();
        tickets.sort();
        tickets
    }

    pub(crate) fn submit_upload(
        &mut self,
        owner: WidgetId,
        request: UploadRequest,
    ) -> Result<UploadTicket, UploadError> {
        let ticket = UploadTicket(self.next_ticket);
        self.next_ticket += 1;

        let uploader = self
            .uploader
            .as_mut()
            .ok_or_else(|| UploadError::Transport("no uploader configured".to_string()))?;
        uploader.submit(ticket, request)?;

        self.tickets.insert(ticket, owner);
        log::debug!("Upload {:?} submitted for {}", ticket, owner);
        Ok(ticket)
    }

    /// Report the outcome of an upload.
    ///
    /// Responses for unknown tickets (the widget was removed, or the ticket
    /// was already answered) are dropped.
    pub fn finish_upload(
        &mut self,
        ticket: UploadTicket,
        result: Result<UploadResponse, UploadError>,
    ) -> Result<(), FormError> {
        let Some(owner) = self.tickets.remove(&ticket) else {
            log::warn!("Dropping response for unknown upload {:?}", ticket);
            return Ok(());
        };
        self.deliver(owner, Delivery::Upload { ticket, result })
    }

    /// Report an upload outcome as the raw response body
    pub fn finish_upload_body(&mut self, ticket: UploadTicket, body: &str) -> Result<(), FormError> {
        self.finish_upload(ticket, UploadResponse::parse(body))
    }
}
