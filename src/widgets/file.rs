//! File and image widget

use super::{copyright_field, field_element};
use semform_core::{
    BoxedWidget, Capability, ChildSlots, FormError, Input, Mount, ParamsSlot, UploadError,
    UploadResponse, UploadTicket, Validation, Widget, WidgetCx,
};
use semform_types::{Field, UploadFile, ValidationError};
use serde_json::{json, Map, Value};

/// Uploads a file through the form's uploader and stores
/// `{path, mime, copyright?, width?, height?}`.
///
/// Only one upload may be in flight. The copyright dialog edits scratch
/// params owned by this widget, which are copied into the stored value
/// whenever they change.
pub struct FileWidget {
    field: Field,
    params: Option<Value>,
    copyright: Option<Value>,
    pending: Option<UploadTicket>,
    errors: Vec<ValidationError>,
}

impl FileWidget {
    pub fn construct(
        _cx: &mut WidgetCx<'_>,
        field: Field,
        params: Option<Value>,
    ) -> Result<BoxedWidget, FormError> {
        let copyright = params
            .as_ref()
            .and_then(|p| p.get("copyright"))
            .cloned()
            .filter(has_entries);
        Ok(Box::new(Self {
            field,
            params,
            copyright,
            pending: None,
            errors: Vec::new(),
        }))
    }

    fn is_image(&self) -> bool {
        self.field.widget_name() == "image"
    }

    fn accepted(&self, cx: &WidgetCx<'_>) -> Vec<String> {
        match &self.field.mimes {
            Some(mimes) => mimes.clone(),
            None if self.is_image() => cx.options().image_mimes.clone(),
            None => Vec::new(),
        }
    }

    fn set_busy(cx: &mut WidgetCx<'_>, busy: bool) {
        if let Some(element) = cx.element_mut() {
            element.busy = busy;
        }
    }

    fn upload(&mut self, cx: &mut WidgetCx<'_>, file: UploadFile) -> Result<(), FormError> {
        if let Some(ticket) = self.pending {
            log::warn!(
                "Upload {:?} for {} still in progress, ignoring {}",
                ticket,
                self.field.name,
                file.name
            );
            return Ok(());
        }
        self.errors.clear();

        let accept = self.accepted(cx);
        if let Some(mime) = &file.mime {
            if !accept.is_empty() && !accept.contains(mime) {
                self.errors.push(
                    UploadError::NotAccepted { mime: mime.clone() }.into(),
                );
                return Ok(());
            }
        }

        match cx.submit_upload(&self.field, accept, file) {
            Ok(ticket) => {
                self.pending = Some(ticket);
                Self::set_busy(cx, true);
            }
            Err(e) => {
                log::warn!("Upload for {} failed: {}", self.field.name, e);
                self.errors.push(e.into());
            }
        }
        Ok(())
    }

    fn stored_value(&self, response: UploadResponse) -> Value {
        let mut params = Map::new();
        params.insert("path".to_string(), Value::String(response.path));
        params.insert("mime".to_string(), Value::String(response.mime));
        if let Some(copyright) = &self.copyright {
            params.insert("copyright".to_string(), copyright.clone());
        }
        if self.is_image() {
            if let Some(width) = response.width {
                params.insert("width".to_string(), Value::from(width));
            }
            if let Some(height) = response.height {
                params.insert("height".to_string(), Value::from(height));
            }
        }
        Value::Object(params)
    }
}

fn has_entries(value: &Value) -> bool {
    value.as_object().map_or(false, |map| !map.is_empty())
}

impl Widget for FileWidget {
    fn field(&self) -> &Field {
        &self.field
    }

    fn attach(&mut self, cx: &mut WidgetCx<'_>, mount: Mount) -> Result<(), FormError> {
        let id = cx.id();
        let element = field_element(id, &self.field);
        cx.mount(mount, element);

        let copyright = self.copyright.clone().unwrap_or_else(|| json!({}));
        cx.set_local(json!({ "copyright": copyright }));
        cx.build_children(
            &[copyright_field()],
            ChildSlots::Keyed(ParamsSlot::local(id)),
            Mount::Dialog(id),
        )?;
        Ok(())
    }

    fn validate(&mut self) -> Validation {
        // upload errors stay until the next attempt
        Validation::Valid(self.params.clone())
    }

    fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    fn provides(&self, capability: Capability) -> bool {
        capability == Capability::Size && self.is_image()
    }

    fn handle(&mut self, cx: &mut WidgetCx<'_>, input: Input) -> Result<(), FormError> {
        match input {
            Input::Upload(file) => self.upload(cx, file),
            Input::RemoveFile => {
                if let Some(ticket) = self.pending.take() {
                    log::debug!("Abandoning upload {:?} for {}", ticket, self.field.name);
                }
                Self::set_busy(cx, false);
                self.params = None;
                cx.set_value(None)
            }
            other => {
                log::debug!("file widget ignores {:?}", other);
                Ok(())
            }
        }
    }

    fn upload_finished(
        &mut self,
        cx: &mut WidgetCx<'_>,
        ticket: UploadTicket,
        result: Result<UploadResponse, UploadError>,
    ) -> Result<(), FormError> {
        if self.pending != Some(ticket) {
            log::warn!("Dropping stale upload {:?} for {}", ticket, self.field.name);
            return Ok(());
        }
        self.pending = None;
        Self::set_busy(cx, false);

        match result {
            Ok(response) => {
                let value = self.stored_value(response);
                self.params = Some(value.clone());
                cx.set_value(Some(value))
            }
            Err(e) => {
                log::warn!("Upload {:?} for {} failed: {}", ticket, self.field.name, e);
                self.errors.push(e.into());
                Ok(())
            }
        }
    }

    fn reference_changed(
        &mut self,
        cx: &mut WidgetCx<'_>,
        attr: &str,
        value: Option<&Value>,
    ) -> Result<(), FormError> {
        if attr != "copyright" {
            return Ok(());
        }
        let copyright = value.filter(|v| has_entries(v)).cloned();
        if copyright == self.copyright {
            return Ok(());
        }
        self.copyright = copyright.clone();

        let Some(Value::Object(mut params)) = self.params.clone() else {
            return Ok(());
        };
        match copyright {
            Some(copyright) => params.insert("copyright".to_string(), copyright),
            None => params.remove("copyright"),
        };
        self.params = Some(Value::Object(params));
        cx.set_value(self.params.clone())
    }
}
