/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

use std::any::Any;
use std::fmt::Debug;

use dyn_clone::DynClone;

/// Marker trait for anything that can travel through a mailbox.
///
/// Messages form an open, dynamically typed union: handlers select them by concrete
/// type through [`Any`], so any `Clone + Debug + Send + Sync + 'static` value qualifies.
/// The [`reactant_message`](crate::prelude::reactant_message) attribute derives the
/// required traits for a plain struct or enum.
pub trait Message: DynClone + Any + Send + Sync + Debug {
    /// Borrows the message as [`Any`] for type tests and `downcast_ref`.
    fn as_any(&self) -> &dyn Any;

    /// Converts a boxed message into a boxed [`Any`] for owned downcasting.
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync>;
}

dyn_clone::clone_trait_object!(Message);

impl<T> Message for T
where
    T: Any + Send + Sync + Debug + DynClone + 'static,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync> {
        self
    }
}

impl dyn Message {
    /// Returns `true` if the message is a `T`.
    ///
    /// `Box<dyn Message>` is itself a `Message`, so calling `as_any` on the box
    /// inspects the box rather than its payload. This method always looks at the payload.
    #[inline]
    #[must_use]
    pub fn is<T: Message>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Borrows the payload as a `T`, if it is one.
    #[inline]
    #[must_use]
    pub fn downcast_ref<T: Message>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// Takes ownership of a boxed message as its concrete type, handing the box back when
/// the type does not match.
pub(crate) fn downcast_message<T: Message>(
    message: Box<dyn Message>,
) -> Result<T, Box<dyn Message>> {
    if message.is::<T>() {
        match message.into_any().downcast::<T>() {
            Ok(value) => Ok(*value),
            // `is::<T>` held a moment ago on the same value.
            Err(_) => unreachable!("message type changed during downcast"),
        }
    } else {
        Err(message)
    }
}
