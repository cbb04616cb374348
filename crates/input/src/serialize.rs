use crate::native::NativeEvent;
use offscreen_protocol::{EventRecord, FieldGroup};

/// Copy the whitelisted fields of `event` into a transport record.
///
/// Only the field groups of the event's kind are copied. Anything the
/// native event doesn't carry stays absent; host-only properties are dropped.
pub fn serialize(event: &NativeEvent) -> EventRecord {
    let mut record = EventRecord::new(event.kind);
    record.time_stamp = event.time_stamp;

    for group in event.kind.field_groups() {
        match group {
            FieldGroup::Position => {
                if let Some(pos) = event.position {
                    record.client_x = Some(pos.client_x);
                    record.client_y = Some(pos.client_y);
                    record.page_x = pos.page_x;
                    record.page_y = pos.page_y;
                }
            }
            FieldGroup::Modifiers => {
                if let Some(m) = event.modifiers {
                    record.shift_key = Some(m.shift);
                    record.ctrl_key = Some(m.ctrl);
                    record.alt_key = Some(m.alt);
                    record.meta_key = Some(m.meta);
                }
            }
            FieldGroup::Buttons => {
                record.button = event.button;
                record.buttons = event.buttons;
            }
            FieldGroup::Pointer => {
                if let Some(p) = &event.pointer {
                    record.pointer_id = Some(p.pointer_id);
                    record.pointer_type = Some(p.pointer_type.clone());
                    record.is_primary = Some(p.is_primary);
                }
            }
            FieldGroup::Wheel => {
                if let Some(w) = event.wheel {
                    record.delta_x = Some(w.x);
                    record.delta_y = Some(w.y);
                    record.delta_z = Some(w.z);
                    record.delta_mode = Some(w.mode);
                }
            }
            FieldGroup::Touches => {
                record.touches = event.touches.clone();
                record.changed_touches = event.changed_touches.clone();
            }
            FieldGroup::Keys => {
                record.key = event.key.clone();
                record.code = event.code.clone();
            }
        }
    }

    record
}
