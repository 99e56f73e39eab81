// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.


mod client_test;
mod orchestrator_test;
mod rss_ranking_test;
mod template_test;
