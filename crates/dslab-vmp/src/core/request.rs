//! Workload trace requests.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::core::resources::{Resources, Revenue};
use crate::core::virtual_machine::{VirtualMachine, VmKey, NO_HOST};

/// How a request is interpreted relative to its VM lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestKind {
    /// `time <= tinit`: first request of a VM.
    Admission,
    /// `tinit < time <= tend`: new resource/utilization profile of an existing VM.
    Update,
    /// `time > tend`: malformed request.
    Invalid,
}

/// One line of the workload trace.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub time: u32,
    pub service_id: u32,
    pub datacenter_id: u32,
    pub vm_id: u32,
    pub resources: Resources,
    /// Utilization in percent.
    pub utilization: Resources,
    pub revenue: Revenue,
    pub tinit: u32,
    pub tend: u32,
}

impl Request {
    pub fn kind(&self) -> RequestKind {
        if self.time > self.tend {
            RequestKind::Invalid
        } else if self.time <= self.tinit {
            RequestKind::Admission
        } else {
            RequestKind::Update
        }
    }

    pub fn key(&self) -> VmKey {
        VmKey {
            service_id: self.service_id,
            datacenter_id: self.datacenter_id,
            vm_id: self.vm_id,
        }
    }

    /// Revenue of the full requested capacity.
    pub fn total_revenue(&self) -> f64 {
        self.resources.dot(&self.revenue)
    }

    /// Builds an unplaced VM described by this request.
    pub fn to_vm(&self) -> VirtualMachine {
        VirtualMachine {
            id: self.vm_id,
            service_id: self.service_id,
            datacenter_id: self.datacenter_id,
            host_id: NO_HOST,
            resources: self.resources,
            utilization: self.utilization,
            revenue: self.revenue,
            tinit: self.tinit,
            tend: self.tend,
        }
    }
}

/// Orders requests by time, then by descending total revenue.
pub fn compare_by_time_and_revenue(a: &Request, b: &Request) -> Ordering {
    a.time.cmp(&b.time).then_with(|| {
        b.total_revenue()
            .partial_cmp(&a.total_revenue())
            .unwrap_or(Ordering::Equal)
    })
}

/// Requests issued in `(start, end]` whose VMs outlive `end`.
///
/// These are the requests a placement snapshotted at `start` did not see.
/// With `by_revenue` the requests of each time unit are ordered by descending revenue.
pub fn missed_requests(requests: &[Request], start: u32, end: u32, by_revenue: bool) -> Vec<Request> {
    let mut result: Vec<Request> = requests
        .iter()
        .filter(|r| r.time > start && r.time <= end && r.tend > end)
        .cloned()
        .collect();
    if by_revenue {
        result.sort_by(compare_by_time_and_revenue);
    } else {
        result.sort_by_key(|r| r.time);
    }
    result
}

/// Whether a never-seen VM arrives strictly inside `(start, end)`.
pub fn new_vm_arrives(requests: &[Request], start: u32, end: u32) -> bool {
    requests
        .iter()
        .any(|r| r.time > start && r.time < end && r.kind() == RequestKind::Admission)
}
