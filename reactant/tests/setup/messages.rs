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
#![allow(unused)]

use reactant::prelude::*;

#[reactant_message]
#[derive(PartialEq, Eq)]
pub struct Ping(pub u32);

#[reactant_message]
#[derive(PartialEq, Eq)]
pub struct Pong(pub u32);

// the high priority variant of Ping
#[reactant_message]
#[derive(PartialEq, Eq)]
pub struct Urgent(pub u32);

#[reactant_message]
pub struct Stop;

#[reactant_message]
pub struct Report;

#[reactant_message]
pub struct Crash(pub String);

#[reactant_message]
#[derive(PartialEq, Eq)]
pub struct Tally(pub Vec<u32>);

#[reactant_message]
#[derive(PartialEq, Eq)]
pub struct Log(pub Vec<String>);
