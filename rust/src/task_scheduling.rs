//! Per-task scheduling capability used by the resolver and the scheduler.
//!
//! A leaf task walks a slot cursor through the scoreboard: forward tasks from
//! their earliest start upward, backward tasks from their latest end
//! downward. Each accepted attempt consumes exactly one slot and advances the
//! cursor, whether or not the slot contributed progress.

use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime};

use crate::attributes::{typed, AttributeValue, Provenance};
use crate::calendar::Interval;
use crate::error::ScheduleError;
use crate::models::{Allocation, Links, ResourceId, ScenarioId, TaskId, WorkState, WorkTarget};
use crate::project::Project;
use crate::resource_schedule::ResourceSchedule;
use crate::scoreboard::Scoreboard;

impl Project {
    /// Reset a task's links, work state and derived values for a new pass,
    /// then pick up input given in parent scenarios.
    pub fn prepare_task_scheduling(&mut self, task: TaskId, sc: ScenarioId) {
        let ancestors = self.ancestor_indices(sc);
        let t = &mut self.tasks[task.index()];
        t.attributes.reset_derived(&self.task_schema, sc.index());
        t.attributes
            .inherit_scenario(&self.task_schema, sc.index(), &ancestors);
        let data = &mut t.scenarios[sc.index()];
        data.links.clear();
        data.work = WorkState::default();
    }

    /// Rebuild a resource's slot schedule and reset its derived values.
    pub fn prepare_resource_scheduling(
        &mut self,
        resource: ResourceId,
        sc: ScenarioId,
        sb: &Scoreboard,
    ) {
        let g = sb.granularity();
        let capacities: Vec<i64> = (0..sb.size())
            .map(|idx| {
                let slot = sb.start() + Duration::seconds(idx as i64 * g);
                self.resource_working_seconds(resource, &Interval::from_slot(slot, g))
            })
            .collect();
        let ancestors = self.ancestor_indices(sc);
        let r = &mut self.resources[resource.index()];
        r.attributes.reset_derived(&self.resource_schema, sc.index());
        r.attributes
            .inherit_scenario(&self.resource_schema, sc.index(), &ancestors);
        r.scenarios[sc.index()].schedule = ResourceSchedule::new(capacities);
    }

    fn ancestor_indices(&self, sc: ScenarioId) -> Vec<usize> {
        self.scenario_ancestors(sc)
            .into_iter()
            .map(ScenarioId::index)
            .collect()
    }

    pub fn links(&self, task: TaskId, sc: ScenarioId) -> &Links {
        &self.tasks[task.index()].scenarios[sc.index()].links
    }

    pub(crate) fn work(&self, task: TaskId, sc: ScenarioId) -> &WorkState {
        &self.tasks[task.index()].scenarios[sc.index()].work
    }

    fn work_mut(&mut self, task: TaskId, sc: ScenarioId) -> &mut WorkState {
        &mut self.tasks[task.index()].scenarios[sc.index()].work
    }

    /// The date of one endpoint of a task, if it is already fixed.
    ///
    /// Containers know an endpoint once all of their children do.
    pub fn known_date(
        &self,
        task: TaskId,
        sc: ScenarioId,
        at_end: bool,
    ) -> Result<Option<NaiveDateTime>, ScheduleError> {
        let t = &self.tasks[task.index()];
        if !t.is_leaf() {
            let mut acc: Option<NaiveDateTime> = None;
            for &child in &t.children {
                match self.known_date(child, sc, at_end)? {
                    None => return Ok(None),
                    Some(d) => {
                        acc = Some(match acc {
                            None => d,
                            Some(a) if at_end => a.max(d),
                            Some(a) => a.min(d),
                        })
                    }
                }
            }
            return Ok(acc);
        }

        let key = if at_end { "end" } else { "start" };
        let attr = self.task_attr(task, sc, key)?;
        let value = typed::date(attr, key)?;
        let work = self.work(task, sc);
        if work.scheduled {
            return Ok(value);
        }
        let links = self.links(task, sc);
        let unconstrained = if at_end {
            links.end_succs.is_empty()
        } else {
            links.start_preds.is_empty()
        };
        if attr.is_provided() && unconstrained {
            return Ok(value);
        }
        let forward = self.task_bool(task, sc, "forward")?;
        if work.is_started() && forward != at_end {
            return Ok(value);
        }
        Ok(None)
    }

    /// Earliest start of a forward task, once all start predecessors are known.
    pub fn earliest_start(
        &self,
        task: TaskId,
        sc: ScenarioId,
        sb: &Scoreboard,
    ) -> Result<Option<NaiveDateTime>, ScheduleError> {
        let mut earliest = self.task_date(task, sc, "start")?;
        for link in &self.links(task, sc).start_preds {
            match self.known_date(link.task, sc, link.on_end)? {
                None => return Ok(None),
                Some(d) => {
                    let bound = d + Duration::seconds(link.gap);
                    earliest = Some(earliest.map_or(bound, |e| e.max(bound)));
                }
            }
        }
        let Some(mut earliest) = earliest else {
            return Ok(None);
        };
        if let Some(min) = self.task_date(task, sc, "minstart")? {
            earliest = earliest.max(min);
        }
        Ok(Some(sb.align_up(earliest)))
    }

    /// Latest end of a backward task, once all end successors are known.
    pub fn latest_end(
        &self,
        task: TaskId,
        sc: ScenarioId,
        sb: &Scoreboard,
    ) -> Result<Option<NaiveDateTime>, ScheduleError> {
        let mut latest = self.task_date(task, sc, "end")?;
        for link in &self.links(task, sc).end_succs {
            match self.known_date(link.task, sc, link.on_end)? {
                None => return Ok(None),
                Some(d) => {
                    let bound = d - Duration::seconds(link.gap);
                    latest = Some(latest.map_or(bound, |l| l.min(bound)));
                }
            }
        }
        let Some(mut latest) = latest else {
            return Ok(None);
        };
        if let Some(max) = self.task_date(task, sc, "maxend")? {
            latest = latest.min(max);
        }
        Ok(Some(sb.align(latest)))
    }

    fn anchor(
        &self,
        task: TaskId,
        sc: ScenarioId,
        sb: &Scoreboard,
    ) -> Result<Option<NaiveDateTime>, ScheduleError> {
        if self.task_bool(task, sc, "forward")? {
            self.earliest_start(task, sc, sb)
        } else {
            self.latest_end(task, sc, sb)
        }
    }

    /// Whether a leaf task has nothing left to wait for in its direction.
    pub fn is_ready_for_scheduling(
        &self,
        task: TaskId,
        sc: ScenarioId,
        sb: &Scoreboard,
    ) -> Result<bool, ScheduleError> {
        if !self.tasks[task.index()].is_leaf() {
            return Ok(false);
        }
        let work = self.work(task, sc);
        if work.scheduled {
            return Ok(false);
        }
        if work.is_started() {
            return Ok(true);
        }
        Ok(self.anchor(task, sc, sb)?.is_some())
    }

    /// Start of the next slot this task wants, or `None` if it cannot proceed.
    pub fn next_candidate_slot(
        &self,
        task: TaskId,
        sc: ScenarioId,
        sb: &Scoreboard,
    ) -> Result<Option<NaiveDateTime>, ScheduleError> {
        if !self.tasks[task.index()].is_leaf() || self.work(task, sc).scheduled {
            return Ok(None);
        }
        let cursor = match self.work(task, sc).cursor {
            Some(c) => c,
            None => match self.anchor(task, sc, sb)? {
                Some(a) => a,
                None => return Ok(None),
            },
        };
        if self.task_bool(task, sc, "forward")? {
            Ok(Some(cursor))
        } else {
            Ok(Some(cursor - Duration::seconds(sb.granularity())))
        }
    }

    /// What a task still needs to be completely scheduled.
    pub fn work_target(&self, task: TaskId, sc: ScenarioId) -> Result<WorkTarget, ScheduleError> {
        if self.task_bool(task, sc, "milestone")? {
            return Ok(WorkTarget::Milestone);
        }
        let duration = self.task_duration(task, sc, "duration")?;
        if duration > 0 {
            return Ok(WorkTarget::Duration(duration));
        }
        let length = self.task_duration(task, sc, "length")?;
        if length > 0 {
            return Ok(WorkTarget::Length(length));
        }
        let effort = self.task_duration(task, sc, "effort")?;
        if effort > 0 {
            return Ok(WorkTarget::Effort(effort));
        }
        let bound = if self.task_bool(task, sc, "forward")? {
            self.task_date(task, sc, "end")?
        } else {
            self.task_date(task, sc, "start")?
        };
        bound.map(WorkTarget::Until).ok_or_else(|| {
            ScheduleError::determinacy(
                &self.tasks[task.index()].id,
                "has no duration, length, effort or fixed opposite end",
            )
        })
    }

    /// Try to consume one slot of work at `slot`.
    ///
    /// Returns `true` when the attempt changed what other tasks may observe:
    /// the task's anchor was fixed, or the task got completely scheduled.
    /// Slots other than the task's own next slot are ignored.
    pub fn attempt_schedule(
        &mut self,
        task: TaskId,
        sc: ScenarioId,
        slot: NaiveDateTime,
        sb: &Scoreboard,
    ) -> Result<bool, ScheduleError> {
        if self.next_candidate_slot(task, sc, sb)? != Some(slot) {
            return Ok(false);
        }
        let forward = self.task_bool(task, sc, "forward")?;
        let g = Duration::seconds(sb.granularity());
        let mut changed = false;

        if !self.work(task, sc).is_started() {
            let anchor = if forward { slot } else { slot + g };
            let key = if forward { "start" } else { "end" };
            self.set_scheduled_date(task, sc, key, anchor)?;
            let target = self.work_target(task, sc)?;
            let allocations = self.allocations(task, sc).len();
            let work = self.work_mut(task, sc);
            work.cursor = Some(anchor);
            work.target = Some(target);
            work.locked = vec![None; allocations];
            changed = true;
        }

        let (cursor, target) = {
            let work = self.work(task, sc);
            match (work.cursor, work.target) {
                (Some(c), Some(t)) => (c, t),
                _ => return Ok(changed),
            }
        };

        if target == WorkTarget::Milestone {
            self.complete(task, sc, cursor, forward)?;
            return Ok(true);
        }
        if let WorkTarget::Until(bound) = target {
            if (forward && cursor >= bound) || (!forward && cursor <= bound) {
                self.complete(task, sc, cursor, forward)?;
                return Ok(true);
            }
        }

        let iv = Interval::from_slot(slot, sb.granularity());
        let idx = sb.to_index(slot)?;
        let progress = match target {
            WorkTarget::Duration(_) => {
                self.book_allocations(task, sc, idx)?;
                sb.granularity()
            }
            WorkTarget::Length(_) => {
                let working = self.working_seconds(&iv);
                if working > 0 {
                    self.book_allocations(task, sc, idx)?;
                }
                working
            }
            WorkTarget::Effort(_) => self.book_allocations(task, sc, idx)?,
            WorkTarget::Until(_) | WorkTarget::Milestone => {
                self.book_allocations(task, sc, idx)?;
                0
            }
        };

        let next = if forward { cursor + g } else { cursor - g };
        let work = self.work_mut(task, sc);
        work.done += progress;
        work.cursor = Some(next);
        let finished = match target {
            WorkTarget::Duration(n) | WorkTarget::Length(n) | WorkTarget::Effort(n) => {
                work.done >= n
            }
            WorkTarget::Until(bound) => {
                if forward {
                    next >= bound
                } else {
                    next <= bound
                }
            }
            WorkTarget::Milestone => true,
        };
        if finished {
            self.complete(task, sc, next, forward)?;
            changed = true;
        }
        Ok(changed)
    }

    fn complete(
        &mut self,
        task: TaskId,
        sc: ScenarioId,
        at: NaiveDateTime,
        forward: bool,
    ) -> Result<(), ScheduleError> {
        let key = if forward { "end" } else { "start" };
        self.set_scheduled_date(task, sc, key, at)?;
        if self.task_bool(task, sc, "milestone")? {
            let other = if forward { "start" } else { "end" };
            self.set_scheduled_date(task, sc, other, at)?;
        }
        self.work_mut(task, sc).scheduled = true;
        Ok(())
    }

    /// Record a date found by the scheduler. A user-given value that already
    /// matches keeps its provenance so the next run still sees it as input.
    pub(crate) fn set_scheduled_date(
        &mut self,
        task: TaskId,
        sc: ScenarioId,
        key: &str,
        date: NaiveDateTime,
    ) -> Result<(), ScheduleError> {
        let value = AttributeValue::Date(Some(date));
        let attr = self.task_attr(task, sc, key)?;
        if attr.is_provided() && attr.value == value {
            return Ok(());
        }
        self.task_set(task, sc, key, value, Provenance::Computed)
    }

    /// Book one candidate per allocation in slot `idx`.
    ///
    /// Returns the booked effort: resource working seconds times efficiency.
    /// If a mandatory allocation cannot be satisfied nothing is booked.
    fn book_allocations(
        &mut self,
        task: TaskId,
        sc: ScenarioId,
        idx: usize,
    ) -> Result<i64, ScheduleError> {
        let allocations: Vec<Allocation> = self.allocations(task, sc).to_vec();
        if allocations.is_empty() {
            return Ok(0);
        }

        let mut picks: Vec<(usize, ResourceId, i64)> = Vec::with_capacity(allocations.len());
        for (ai, allocation) in allocations.iter().enumerate() {
            let locked = self.work(task, sc).locked.get(ai).copied().flatten();
            let candidates = match locked {
                Some(r) => vec![r],
                None => allocation.candidates.clone(),
            };
            let mut pick = None;
            for r in candidates {
                if picks.iter().any(|&(_, p, _)| p == r) {
                    continue;
                }
                let free = self.resources[r.index()].scenarios[sc.index()]
                    .schedule
                    .available(idx);
                if free > 0 && self.within_limits(r, sc, idx, free)? {
                    pick = Some((ai, r, free));
                    break;
                }
            }
            match pick {
                Some(p) => picks.push(p),
                None if allocation.mandatory => return Ok(0),
                None => {}
            }
        }

        let mut effort = 0.0;
        for (ai, resource, free) in picks {
            let efficiency = self.resource_float(resource, sc, "efficiency")?;
            if !self.resources[resource.index()].scenarios[sc.index()]
                .schedule
                .book(idx, task)
            {
                continue;
            }
            let persistent = allocations[ai].persistent;
            let work = self.work_mut(task, sc);
            work.bookings.push((idx, resource));
            if persistent {
                work.locked[ai] = Some(resource);
            }
            effort += free as f64 * efficiency;
        }
        Ok(effort.round() as i64)
    }

    /// Whether booking `seconds` more in slot `idx` keeps the resource within
    /// its `dailymax` and `weeklymax`. A limit of 0 is no limit.
    fn within_limits(
        &self,
        resource: ResourceId,
        sc: ScenarioId,
        idx: usize,
        seconds: i64,
    ) -> Result<bool, ScheduleError> {
        let Some(origin) = self.start() else {
            return Ok(true);
        };
        let g = self.granularity();
        let date = origin + Duration::seconds(idx as i64 * g);
        let day = date.date();
        let monday = day - Duration::days(day.weekday().num_days_from_monday() as i64);
        let schedule = &self.resources[resource.index()].scenarios[sc.index()].schedule;

        for (key, from, days) in [("dailymax", day, 1), ("weeklymax", monday, 7)] {
            let limit = self.resource_duration(resource, sc, key)?;
            if limit <= 0 {
                continue;
            }
            let period_start = from.and_time(NaiveTime::MIN);
            let period_end = period_start + Duration::days(days);
            let first = ((period_start - origin).num_seconds().max(0) / g) as usize;
            let last = ((period_end - origin).num_seconds().max(0) / g) as usize;
            if schedule.booked_seconds(first..last) + seconds > limit {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Flag a task whose next slot lies outside the project.
    /// Returns `true` the first time a task is flagged in a pass.
    pub fn mark_runaway(&mut self, task: TaskId, sc: ScenarioId) -> bool {
        let work = self.work_mut(task, sc);
        let first = !work.runaway;
        work.runaway = true;
        first
    }
}
