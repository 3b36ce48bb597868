//! Qualified names of the framework annotations and the external types their
//! companion methods are checked against.

pub const UPDATE_LISTENER: &str = "com.lowdragmc.lowdraglib2.syncdata.annotation.UpdateListener";
pub const CONDITIONAL_SYNCED: &str =
    "com.lowdragmc.lowdraglib2.syncdata.annotation.ConditionalSynced";
pub const READ_ONLY_MANAGED: &str = "com.lowdragmc.lowdraglib2.syncdata.annotation.ReadOnlyManaged";
pub const SKIP_PERSISTED_VALUE: &str =
    "com.lowdragmc.lowdraglib2.syncdata.annotation.SkipPersistedValue";
pub const PERSISTED: &str = "com.lowdragmc.lowdraglib2.syncdata.annotation.Persisted";
pub const DESC_SYNCED: &str = "com.lowdragmc.lowdraglib2.syncdata.annotation.DescSynced";
pub const REQUIRE_RERENDER: &str = "com.lowdragmc.lowdraglib2.syncdata.annotation.RequireRerender";

pub const CONFIGURABLE: &str = "com.lowdragmc.lowdraglib2.configurator.annotation.Configurable";
pub const CONFIG_HEADER: &str = "com.lowdragmc.lowdraglib2.configurator.annotation.ConfigHeader";
pub const CONFIG_SETTER: &str = "com.lowdragmc.lowdraglib2.configurator.annotation.ConfigSetter";
pub const CONFIG_LIST: &str = "com.lowdragmc.lowdraglib2.configurator.annotation.ConfigList";
pub const CONFIG_SELECTOR: &str = "com.lowdragmc.lowdraglib2.configurator.annotation.ConfigSelector";
pub const CONFIG_SEARCH: &str = "com.lowdragmc.lowdraglib2.configurator.annotation.ConfigSearch";
pub const CONFIG_COLOR: &str = "com.lowdragmc.lowdraglib2.configurator.annotation.ConfigColor";
pub const CONFIG_HDR: &str = "com.lowdragmc.lowdraglib2.configurator.annotation.ConfigHDR";
pub const CONFIG_NUMBER: &str = "com.lowdragmc.lowdraglib2.configurator.annotation.ConfigNumber";
pub const DEFAULT_VALUE: &str = "com.lowdragmc.lowdraglib2.configurator.annotation.DefaultValue";

pub const RPC_PACKET: &str = "com.lowdragmc.lowdraglib2.networking.rpc.RPCPacket";
pub const RPC_DISTRIBUTOR: &str = "com.lowdragmc.lowdraglib2.networking.rpc.RPCPacketDistributor";
pub const RPC_SENDER: &str = "com.lowdragmc.lowdraglib2.syncdata.rpc.RPCSender";

pub const TAG: &str = "net.minecraft.nbt.Tag";
pub const CONFIGURATOR: &str = "com.lowdragmc.lowdraglib2.configurator.ui.Configurator";
pub const CONFIGURATOR_GROUP: &str = "com.lowdragmc.lowdraglib2.configurator.ui.ConfiguratorGroup";
pub const SEARCH_CONFIGURATOR: &str =
    "com.lowdragmc.lowdraglib2.configurator.ui.SearchComponentConfigurator.ISearchConfigurator";
pub const VECTOR4F: &str = "org.joml.Vector4f";

pub const SUPPLIER: &str = "java.util.function.Supplier";
pub const CONSUMER: &str = "java.util.function.Consumer";
pub const COLLECTION: &str = "java.util.Collection";
pub const OBJECT: &str = "java.lang.Object";

/// `@Simple` form used in messages.
pub fn at_simple(qualified: &str) -> String {
    format!("@{}", crate::types::simple_name(qualified))
}
