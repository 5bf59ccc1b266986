//! Construction of live nodes from virtual nodes.

use crate::TreeCx;
use crate::native::NativeSpec;
use crate::tree::{Attach, DomError, LiveKind};
use core_types::NodeKey;
use serde_json::Value;

impl TreeCx<'_> {
    /// Build a virtual node into a live one and hand it to the sink.
    ///
    /// Children of an element are built in order with append sinks. A
    /// native node is delegated wholesale to its registered builder; the
    /// generic engine does not look at its children.
    pub fn build(&mut self, vnode: &vdom::VNode, attach: Attach) -> Result<NodeKey, DomError> {
        match vnode {
            vdom::VNode::Text { contents } => {
                let key = self.tree.alloc(LiveKind::Text {
                    text: contents.clone(),
                });
                self.attach_new(key, attach)?;
                Ok(key)
            }
            vdom::VNode::Element {
                tag_name,
                attrs,
                props,
                events,
                kids,
            } => {
                let namespace = props
                    .get("namespace")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                let key = self.tree.alloc(LiveKind::Element {
                    tag: tag_name.clone(),
                    namespace,
                    attrs: attrs.clone(),
                    props: props.clone(),
                });
                self.attach_new(key, attach)?;
                for (name, handler) in events {
                    self.bindings.set_event(key, name, handler.clone());
                }
                for kid in kids {
                    self.build(kid, Attach::Append { parent: key })?;
                }
                Ok(key)
            }
            vdom::VNode::Native {
                kind,
                id,
                attrs,
                props,
                events,
                extra,
            } => {
                let builder = self
                    .natives
                    .builder(kind)
                    .ok_or_else(|| DomError::UnknownNativeKind(kind.clone()))?;
                let spec = NativeSpec {
                    id,
                    attrs,
                    props,
                    events,
                    extra,
                };
                let mounted = builder(self, attach, &spec)?;
                self.bindings.add_mount(mounted.root, mounted.mount);
                Ok(mounted.root)
            }
        }
    }
}
