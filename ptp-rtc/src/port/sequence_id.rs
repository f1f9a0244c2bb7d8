/// Sequence ids to match follow up messages and responses against. Ids
/// wrap naturally at 16 bits and are only ever compared for equality.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub(crate) struct SequenceIdRecords {
    /// Id of the last Sync accepted from the master
    pub(crate) sync: u16,
    /// Id of the outstanding PDelayReq
    pub(crate) pdelay_req: u16,
    /// Id of the PDelayResp accepted in the current cycle
    pub(crate) pdelay_resp: u16,
}
